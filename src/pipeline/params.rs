//! Node parameters from the graph description.

use crate::pipeline::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A parameter value as written in the description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(v) => Some(*v),
            ConfigValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(v) => Some(v),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "a boolean",
            ConfigValue::Int(_) => "an integer",
            ConfigValue::Float(_) => "a number",
            ConfigValue::String(_) => "a string",
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::String(v.to_string())
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(v) => write!(f, "{}", v),
            ConfigValue::Int(v) => write!(f, "{}", v),
            ConfigValue::Float(v) => write!(f, "{}", v),
            ConfigValue::String(v) => write!(f, "\"{}\"", v),
        }
    }
}

/// Parameters of one node, with typed accessors that report the node type on
/// failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeParams(pub BTreeMap<String, ConfigValue>);

impl NodeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    /// Reject keys the node type does not know.
    pub fn expect_only(&self, node_type: &str, known: &[&str]) -> PipelineResult<()> {
        match self.0.keys().find(|k| !known.contains(&k.as_str())) {
            Some(key) => Err(PipelineError::MalformedGraph(format!(
                "unknown parameter '{}' for {}",
                key, node_type
            ))),
            None => Ok(()),
        }
    }

    pub fn require_str(&self, node_type: &str, key: &str) -> PipelineResult<&str> {
        self.str_or(node_type, key, None)?.ok_or_else(|| {
            PipelineError::MalformedGraph(format!("{} requires parameter '{}'", node_type, key))
        })
    }

    pub fn str_or<'a>(
        &'a self,
        node_type: &str,
        key: &str,
        default: Option<&'a str>,
    ) -> PipelineResult<Option<&'a str>> {
        match self.0.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| invalid(node_type, key, value, "a string")),
        }
    }

    pub fn bool_or(&self, node_type: &str, key: &str, default: bool) -> PipelineResult<bool> {
        match self.0.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| invalid(node_type, key, value, "a boolean")),
        }
    }

    pub fn int_or(&self, node_type: &str, key: &str, default: i64) -> PipelineResult<i64> {
        match self.0.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_int()
                .ok_or_else(|| invalid(node_type, key, value, "an integer")),
        }
    }
}

fn invalid(node_type: &str, key: &str, value: &ConfigValue, expected: &str) -> PipelineError {
    PipelineError::MalformedGraph(format!(
        "parameter '{}' of {} must be {}, got {} {}",
        key,
        node_type,
        expected,
        value.type_name(),
        value
    ))
}
