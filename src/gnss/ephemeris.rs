//! Broadcast ephemeris records.
//!
//! One [`Ephemeris`] is produced per broadcast message in a navigation file.
//! The payload depends on the constellation: GPS, Galileo, BeiDou, QZSS and
//! IRNSS broadcast Keplerian elements, GLONASS and SBAS broadcast a state
//! vector (position, velocity, acceleration) at a reference time.

use crate::gnss::types::{Epoch, SatId};
use serde::{Deserialize, Serialize};

/// A single decoded broadcast message. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ephemeris {
    /// Satellite the message was broadcast for
    pub sat: SatId,
    /// Time of clock (reference epoch of the message)
    pub toc: Epoch,
    /// Constellation-specific orbit and clock parameters
    pub data: EphemerisData,
}

impl Ephemeris {
    /// Clock bias at the time of clock in seconds.
    pub fn clock_bias(&self) -> f64 {
        match &self.data {
            EphemerisData::Kepler(k) => k.af0,
            EphemerisData::Glonass(g) => -g.minus_tau_n,
            EphemerisData::Sbas(s) => s.a_gf0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EphemerisData {
    Kepler(KeplerEphemeris),
    Glonass(GlonassEphemeris),
    Sbas(SbasEphemeris),
}

/// Keplerian broadcast elements.
///
/// Field names follow the GPS ICD. Where other systems reuse a slot with a
/// different meaning, the field documentation lists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeplerEphemeris {
    /// SV clock bias [s]
    pub af0: f64,
    /// SV clock drift [s/s]
    pub af1: f64,
    /// SV clock drift rate [s/s²]
    pub af2: f64,

    /// IODE (GPS/QZSS), IODnav (Galileo), AODE (BeiDou), IODEC (IRNSS)
    pub iode: f64,
    /// Amplitude of the sine correction to the orbit radius [m]
    pub crs: f64,
    /// Mean motion difference [rad/s]
    pub delta_n: f64,
    /// Mean anomaly at reference time [rad]
    pub m0: f64,

    /// Amplitude of the cosine correction to the argument of latitude [rad]
    pub cuc: f64,
    /// Eccentricity
    pub e: f64,
    /// Amplitude of the sine correction to the argument of latitude [rad]
    pub cus: f64,
    /// Square root of the semi-major axis [√m]
    pub sqrt_a: f64,

    /// Time of ephemeris [s of week]
    pub toe: f64,
    /// Amplitude of the cosine correction to the inclination [rad]
    pub cic: f64,
    /// Longitude of ascending node at weekly epoch [rad]
    pub omega0: f64,
    /// Amplitude of the sine correction to the inclination [rad]
    pub cis: f64,

    /// Inclination at reference time [rad]
    pub i0: f64,
    /// Amplitude of the cosine correction to the orbit radius [m]
    pub crc: f64,
    /// Argument of perigee [rad]
    pub omega: f64,
    /// Rate of right ascension [rad/s]
    pub omega_dot: f64,

    /// Rate of inclination [rad/s]
    pub i_dot: f64,
    /// Codes on L2 (GPS), data sources (Galileo), spare (BeiDou)
    pub codes: f64,
    /// Week number, continuous (not mod 1024) in the system's own week count
    pub week: f64,
    /// L2 P data flag (GPS), spare elsewhere
    pub l2p_flag: f64,

    /// SV accuracy [m] (GPS), SISA [m] (Galileo)
    pub accuracy: f64,
    /// SV health
    pub health: f64,
    /// TGD (GPS), BGD E5a/E1 (Galileo), TGD1 B1/B3 (BeiDou) [s]
    pub tgd: f64,
    /// IODC (GPS/QZSS), BGD E5b/E1 (Galileo), TGD2 B2/B3 (BeiDou)
    pub iodc: f64,

    /// Transmission time of message [s of week]
    pub transmission_time: f64,
    /// Fit interval (GPS/QZSS) or AODC (BeiDou), when present
    pub fit_interval: Option<f64>,
}

/// GLONASS broadcast state vector. Coordinates in PZ-90 [km, km/s, km/s²].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlonassEphemeris {
    /// SV clock bias, stored as broadcast (-TauN) [s]
    pub minus_tau_n: f64,
    /// SV relative frequency bias (+GammaN)
    pub gamma_n: f64,
    /// Message frame time tk [s of day UTC]
    pub frame_time: f64,

    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub acceleration: [f64; 3],

    /// Health flag Bn (0 = OK)
    pub health: f64,
    /// Frequency channel number k (-7..+13)
    pub frequency_number: i8,
    /// Age of operational information E [days]
    pub age: f64,
}

/// SBAS broadcast state vector. Coordinates in WGS-84 [km, km/s, km/s²].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SbasEphemeris {
    /// SV clock bias aGf0 [s]
    pub a_gf0: f64,
    /// SV relative frequency bias aGf1
    pub a_gf1: f64,
    /// Transmission time of message [s of GPS week]
    pub transmission_time: f64,

    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub acceleration: [f64; 3],

    pub health: f64,
    /// Accuracy code (URA)
    pub ura: f64,
    /// Issue of data navigation
    pub iodn: f64,
}
