//! Typed data slots.
//!
//! A pin's kind is fixed when its node is built; links are only accepted
//! between pins of the same kind, so readers never need to re-check the kind
//! of a value they receive.

use crate::gnss::{Ephemeris, SharedNavInfo};
use crate::pipeline::id::PinId;
use std::fmt;
use std::sync::Arc;

/// The kind of data a pin carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinKind {
    /// A shared ephemeris store.
    NavInfo,
    /// A single broadcast message.
    Ephemeris,
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinKind::NavInfo => f.write_str("GnssNavInfo"),
            PinKind::Ephemeris => f.write_str("Ephemeris"),
        }
    }
}

/// Value held by a pin.
#[derive(Debug, Clone)]
pub enum PinValue {
    NavInfo(SharedNavInfo),
    Ephemeris(Arc<Ephemeris>),
}

impl PinValue {
    pub fn kind(&self) -> PinKind {
        match self {
            PinValue::NavInfo(_) => PinKind::NavInfo,
            PinValue::Ephemeris(_) => PinKind::Ephemeris,
        }
    }

    pub fn as_nav_info(&self) -> Option<&SharedNavInfo> {
        match self {
            PinValue::NavInfo(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ephemeris(&self) -> Option<&Arc<Ephemeris>> {
        match self {
            PinValue::Ephemeris(v) => Some(v),
            _ => None,
        }
    }
}

/// Input slot of a node: at most one upstream pin.
#[derive(Debug, Clone)]
pub struct InputPin {
    pub id: PinId,
    pub name: String,
    pub kind: PinKind,
    /// Output pin feeding this input
    pub source: Option<PinId>,
    value: Option<PinValue>,
}

impl InputPin {
    pub fn new(id: PinId, name: impl Into<String>, kind: PinKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            source: None,
            value: None,
        }
    }

    /// Latest upstream value, `None` until the first propagation.
    pub fn value(&self) -> Option<&PinValue> {
        self.value.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    pub(crate) fn set(&mut self, value: PinValue) {
        debug_assert_eq!(value.kind(), self.kind);
        self.value = Some(value);
    }
}

/// Output slot of a node: any number of downstream pins.
#[derive(Debug, Clone)]
pub struct OutputPin {
    pub id: PinId,
    pub name: String,
    pub kind: PinKind,
    /// Input pins fed by this output, in link order
    pub targets: Vec<PinId>,
    value: Option<PinValue>,
    dirty: bool,
    writes: u64,
}

impl OutputPin {
    pub fn new(id: PinId, name: impl Into<String>, kind: PinKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            targets: Vec::new(),
            value: None,
            dirty: false,
            writes: 0,
        }
    }

    /// Store a value and mark the pin for propagation.
    pub fn write(&mut self, value: PinValue) {
        debug_assert_eq!(value.kind(), self.kind);
        self.value = Some(value);
        self.dirty = true;
        self.writes += 1;
    }

    /// Latest written value, `None` if the node never wrote.
    pub fn value(&self) -> Option<&PinValue> {
        self.value.as_ref()
    }

    /// Number of writes since the graph was built.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Take the pending value if the pin was written since the last call.
    pub(crate) fn take_dirty(&mut self) -> Option<PinValue> {
        if !std::mem::take(&mut self.dirty) {
            return None;
        }
        self.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_write_marks_dirty_once() {
        let mut pin = OutputPin::new(PinId(1), "GnssNavInfo", PinKind::NavInfo);
        assert!(pin.value().is_none());
        assert!(pin.take_dirty().is_none());

        pin.write(PinValue::NavInfo(SharedNavInfo::default()));
        assert!(pin.take_dirty().is_some());
        assert!(pin.take_dirty().is_none());
        assert!(pin.value().is_some());
        assert_eq!(pin.write_count(), 1);
    }

    #[test]
    fn test_typed_accessors() {
        let value = PinValue::NavInfo(SharedNavInfo::default());
        assert_eq!(value.kind(), PinKind::NavInfo);
        assert!(value.as_nav_info().is_some());
        assert!(value.as_ephemeris().is_none());
    }
}
