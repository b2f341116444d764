//! Built-in node implementations.

pub mod ephemeris_collector;
pub mod nav_info_merge;
pub mod rinex_nav_file;
pub mod satellite_filter;

pub use ephemeris_collector::EphemerisCollectorNode;
pub use nav_info_merge::{GnssNavInfoMergeNode, DEFAULT_MERGE_INPUTS};
pub use rinex_nav_file::RinexNavFileNode;
pub use satellite_filter::SatelliteFilterNode;
