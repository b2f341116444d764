//! GNSS data model and navigation file decoding.

pub mod ephemeris;
pub mod nav_info;
pub mod rinex;
pub mod types;

pub use ephemeris::{Ephemeris, EphemerisData, GlonassEphemeris, KeplerEphemeris, SbasEphemeris};
pub use nav_info::{GnssNavInfo, IonosphericCorrection, SharedNavInfo, TimeSystemCorrection};
pub use types::{Constellation, Epoch, SatId, TimeSystem};
