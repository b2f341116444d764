//! Port descriptors for the node system.
//!
//! Each node declares its ports (inputs/outputs) via `PortDescriptor` lists.
//! The graph builder creates one pin per descriptor and uses the kinds to
//! validate links.

use crate::pipeline::pin::PinKind;
use std::borrow::Cow;

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

/// Descriptor for a node's port.
#[derive(Debug, Clone)]
pub struct PortDescriptor {
    pub name: Cow<'static, str>,
    pub direction: PortDirection,
    pub kind: PinKind,
}

impl PortDescriptor {
    pub const fn input(name: &'static str, kind: PinKind) -> Self {
        Self {
            name: Cow::Borrowed(name),
            direction: PortDirection::Input,
            kind,
        }
    }

    pub const fn output(name: &'static str, kind: PinKind) -> Self {
        Self {
            name: Cow::Borrowed(name),
            direction: PortDirection::Output,
            kind,
        }
    }

    /// Input port with a generated name.
    pub fn numbered_input(prefix: &str, index: usize, kind: PinKind) -> Self {
        Self {
            name: Cow::Owned(format!("{}{}", prefix, index)),
            direction: PortDirection::Input,
            kind,
        }
    }
}
