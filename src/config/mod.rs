//! Run configuration.
//!
//! Settings are read from a TOML file:
//!
//! ```toml
//! fixture_root = "tests/data"
//!
//! [logging]
//! level = "info,navflow=debug"
//! file = "/tmp/navflow.log"
//!
//! [scheduler]
//! policy = "round_robin"    # or "chronological" (default)
//! records_per_turn = 4
//! ```
//!
//! Every key is optional. The default file lives in the platform config
//! directory:
//! - **Linux**: `~/.config/navflow/navflow.toml`
//! - **macOS**: `~/Library/Application Support/navflow/navflow.toml`
//! - **Windows**: `%APPDATA%\navflow\navflow.toml`

use crate::error::{NavFlowError, Result};
use crate::logger::{Logger, DEFAULT_LEVEL};
use crate::pipeline::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "navflow";

/// Config filename
pub const CONFIG_FILE: &str = "navflow.toml";

/// Get the application config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Env-filter directive
    pub level: String,
    /// Optional log file, appended to
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Install the logger this section describes.
    pub fn install(&self) -> Result<Logger> {
        match &self.file {
            Some(path) => Logger::console_and_file(&self.level, path),
            None => Logger::console(&self.level),
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory relative source paths in graph descriptions resolve against.
    /// Defaults to the directory of the graph description.
    pub fixture_root: Option<PathBuf>,

    pub logging: LoggingConfig,

    pub scheduler: SchedulerConfig,
}

impl RunConfig {
    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NavFlowError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| e.with_context(format!("Failed to load {:?}", path)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| NavFlowError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load the default config file, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = default_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                NavFlowError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| NavFlowError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            NavFlowError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Fixture root for a graph description at `flow`.
    pub fn fixture_root_for(&self, flow: &Path) -> PathBuf {
        match &self.fixture_root {
            Some(root) => root.clone(),
            None => flow
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SchedulePolicy;

    #[test]
    fn test_empty_config_is_default() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.scheduler.records_per_turn, 1);
        assert_eq!(config.scheduler.policy, SchedulePolicy::Chronological);
    }

    #[test]
    fn test_parse_sections() {
        let config = RunConfig::from_toml(
            r#"
            fixture_root = "tests/data"

            [logging]
            level = "debug"
            file = "/tmp/navflow.log"

            [scheduler]
            policy = "round_robin"
            records_per_turn = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.fixture_root, Some(PathBuf::from("tests/data")));
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/navflow.log")));
        assert_eq!(config.scheduler.records_per_turn, 8);
        assert_eq!(config.scheduler.policy, SchedulePolicy::RoundRobin);
    }

    #[test]
    fn test_bad_value_is_config_error() {
        let err = RunConfig::from_toml("[scheduler]\nrecords_per_turn = \"many\"").unwrap_err();
        assert!(matches!(err, NavFlowError::Config(_)));
        let err = RunConfig::from_toml("[scheduler]\npolicy = \"random\"").unwrap_err();
        assert!(matches!(err, NavFlowError::Config(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = RunConfig {
            fixture_root: Some(PathBuf::from("/data/rinex")),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(RunConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_fixture_root_defaults_to_flow_dir() {
        let config = RunConfig::default();
        assert_eq!(
            config.fixture_root_for(Path::new("/flows/gps.flow")),
            PathBuf::from("/flows")
        );
        let config = RunConfig {
            fixture_root: Some(PathBuf::from("/data")),
            ..Default::default()
        };
        assert_eq!(
            config.fixture_root_for(Path::new("/flows/gps.flow")),
            PathBuf::from("/data")
        );
    }
}
