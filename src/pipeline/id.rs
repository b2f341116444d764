//! Identity types for the pipeline system.
//!
//! `NodeId` and `LinkId` are newtypes over `u32` that serve as direct array
//! indices into the graph's storage vectors. `PinId` is the handle assigned by
//! the graph description and is resolved through the graph's pin table.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Index into `Graph::nodes`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Graph-unique pin handle.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(pub u32);

impl fmt::Debug for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PinId({})", self.0)
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out pin handles nobody has claimed.
///
/// Fresh handles continue above the highest one in use. Once that counter
/// passes `u32::MAX`, the lowest free handles are taken instead.
pub(crate) struct PinAllocator {
    used: HashSet<PinId>,
    next: Option<u32>,
    scan: Option<u32>,
}

impl PinAllocator {
    pub(crate) fn new(used: impl IntoIterator<Item = PinId>) -> Self {
        let used: HashSet<PinId> = used.into_iter().collect();
        let next = match used.iter().max() {
            Some(highest) => highest.0.checked_add(1),
            None => Some(1),
        };
        Self {
            used,
            next,
            scan: Some(1),
        }
    }

    /// Next unused handle, or `None` when every `u32` is taken.
    pub(crate) fn allocate(&mut self) -> Option<PinId> {
        if let Some(n) = self.next {
            self.next = n.checked_add(1);
            self.used.insert(PinId(n));
            return Some(PinId(n));
        }
        while let Some(candidate) = self.scan {
            self.scan = candidate.checked_add(1);
            if self.used.insert(PinId(candidate)) {
                return Some(PinId(candidate));
            }
        }
        None
    }
}

/// Index into `Graph::links`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub u32);

impl LinkId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkId({})", self.0)
    }
}
