//! Ephemeris store.
//!
//! [`GnssNavInfo`] aggregates decoded broadcast messages per satellite plus the
//! header-level corrections of the files they came from. It is pure data:
//! insertion appends, nothing is deduplicated or reordered.

use crate::gnss::ephemeris::Ephemeris;
use crate::gnss::types::{Constellation, SatId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Broadcast ionospheric model coefficients from a file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonosphericCorrection {
    /// Correction type as written in RINEX 3 (`GPSA`, `GPSB`, `GAL`, `BDSA`, ...)
    pub kind: String,
    pub coefficients: [f64; 4],
}

/// Offset between a GNSS time system and another time system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSystemCorrection {
    /// Correction type as written in RINEX 3 (`GPUT`, `GAUT`, `GLUT`, `GPGA`, ...)
    pub kind: String,
    pub a0: f64,
    pub a1: f64,
    /// Reference time [s of week]
    pub reference_time: i64,
    /// Reference week number
    pub reference_week: i64,
}

/// Per-satellite collection of broadcast ephemerides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GnssNavInfo {
    /// Satellite systems declared by the source headers or seen in records
    pub satellite_systems: BTreeSet<Constellation>,
    /// Ephemerides per satellite, in insertion (file) order
    pub broadcast_ephemeris: BTreeMap<SatId, Vec<Ephemeris>>,
    pub ionospheric_corrections: Vec<IonosphericCorrection>,
    pub time_system_corrections: Vec<TimeSystemCorrection>,
    pub leap_seconds: Option<i32>,
}

impl GnssNavInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the sequence of its satellite.
    pub fn insert(&mut self, ephemeris: Ephemeris) {
        self.satellite_systems.insert(ephemeris.sat.constellation);
        self.broadcast_ephemeris
            .entry(ephemeris.sat)
            .or_default()
            .push(ephemeris);
    }

    /// Number of distinct satellites with at least one record.
    pub fn satellite_count(&self) -> usize {
        self.broadcast_ephemeris.len()
    }

    /// Total number of records across all satellites.
    pub fn message_count(&self) -> usize {
        self.broadcast_ephemeris.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.broadcast_ephemeris.is_empty()
    }

    /// Records of one satellite, empty if the satellite is unknown.
    pub fn ephemerides(&self, sat: SatId) -> &[Ephemeris] {
        self.broadcast_ephemeris
            .get(&sat)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate `(satellite, records)` in satellite order.
    pub fn iter(&self) -> impl Iterator<Item = (&SatId, &Vec<Ephemeris>)> {
        self.broadcast_ephemeris.iter()
    }

    /// Satellites of one constellation.
    pub fn satellites_of(&self, constellation: Constellation) -> impl Iterator<Item = SatId> + '_ {
        self.broadcast_ephemeris
            .keys()
            .copied()
            .filter(move |sat| sat.constellation == constellation)
    }

    /// Union header-level information of `other` into `self`.
    ///
    /// Corrections already present (same kind and values) are not repeated.
    pub fn merge_header(&mut self, other: &GnssNavInfo) {
        self.satellite_systems
            .extend(other.satellite_systems.iter().copied());
        for corr in &other.ionospheric_corrections {
            if !self.ionospheric_corrections.contains(corr) {
                self.ionospheric_corrections.push(corr.clone());
            }
        }
        for corr in &other.time_system_corrections {
            if !self.time_system_corrections.contains(corr) {
                self.time_system_corrections.push(corr.clone());
            }
        }
        if self.leap_seconds.is_none() {
            self.leap_seconds = other.leap_seconds;
        }
    }
}

/// Shared handle to a store with a single writer and any number of readers.
///
/// Output pins carrying a store hold one of these; downstream input pins and
/// post-completion observers hold clones of the same handle. Only the node
/// that owns the store can take the write lock; everyone else reads.
///
/// ```compile_fail
/// use navflow::{GnssNavInfo, SharedNavInfo};
///
/// let store = SharedNavInfo::new(GnssNavInfo::default());
/// store.write().leap_seconds = Some(18);
/// ```
///
/// ```
/// use navflow::{GnssNavInfo, SharedNavInfo};
///
/// let store = SharedNavInfo::new(GnssNavInfo::default());
/// assert!(store.read().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedNavInfo(Arc<RwLock<GnssNavInfo>>);

impl SharedNavInfo {
    pub fn new(info: GnssNavInfo) -> Self {
        Self(Arc::new(RwLock::new(info)))
    }

    /// Read access. A writer that panicked leaves the store readable.
    pub fn read(&self) -> RwLockReadGuard<'_, GnssNavInfo> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access, reserved for the owning node.
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, GnssNavInfo> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Owned copy of the current content.
    pub fn snapshot(&self) -> GnssNavInfo {
        self.read().clone()
    }

    /// Whether two handles refer to the same store.
    pub fn ptr_eq(&self, other: &SharedNavInfo) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
