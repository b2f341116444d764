//! RINEX navigation file decoding.
//!
//! Supports major versions 2 (GPS `N`, GLONASS `G` and SBAS `H` files) and 3
//! (single-system and mixed files). A [`NavDecoder`] parses the header on
//! construction and then yields one [`Ephemeris`](crate::gnss::Ephemeris) per
//! broadcast message.

mod decoder;
mod error;
mod fields;
mod header;
mod record;
mod version;

pub use decoder::{NavDecoder, NavPoll};
pub use error::{ParseWarning, RinexError};
pub use header::NavHeader;
pub use version::{NavFormat, RinexVersion};
