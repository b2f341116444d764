//! Satellite identity and time tagging shared by the decoder and the store.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GNSS constellation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Constellation {
    /// US Global Positioning System
    Gps,
    /// Russian GLONASS
    Glonass,
    /// European Galileo
    Galileo,
    /// Chinese BeiDou
    BeiDou,
    /// Japanese Quasi-Zenith Satellite System
    Qzss,
    /// Indian Regional Navigation Satellite System (NavIC)
    Irnss,
    /// Satellite Based Augmentation Systems (WAAS, EGNOS, MSAS, ...)
    Sbas,
}

impl Constellation {
    /// Parse the single-letter system identifier used by RINEX 3.
    pub fn from_rinex_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'G' => Some(Self::Gps),
            'R' => Some(Self::Glonass),
            'E' => Some(Self::Galileo),
            'C' => Some(Self::BeiDou),
            'J' => Some(Self::Qzss),
            'I' => Some(Self::Irnss),
            'S' => Some(Self::Sbas),
            _ => None,
        }
    }

    /// Single-letter RINEX system identifier.
    pub fn rinex_char(&self) -> char {
        match self {
            Self::Gps => 'G',
            Self::Glonass => 'R',
            Self::Galileo => 'E',
            Self::BeiDou => 'C',
            Self::Qzss => 'J',
            Self::Irnss => 'I',
            Self::Sbas => 'S',
        }
    }

    /// Time system the broadcast epochs of this constellation are expressed in.
    pub fn time_system(&self) -> TimeSystem {
        match self {
            Self::Gps | Self::Sbas => TimeSystem::Gpst,
            Self::Glonass => TimeSystem::Utc,
            Self::Galileo => TimeSystem::Gst,
            Self::BeiDou => TimeSystem::Bdt,
            Self::Qzss => TimeSystem::Qzsst,
            Self::Irnss => TimeSystem::Irnsst,
        }
    }

    /// Parse a comma-separated list of RINEX system letters, e.g. `"G,E"`.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, String> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::from_rinex_char(c)
                        .ok_or_else(|| format!("unknown satellite system '{}'", part)),
                    _ => Err(format!("unknown satellite system '{}'", part)),
                }
            })
            .collect()
    }
}

impl fmt::Display for Constellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gps => write!(f, "GPS"),
            Self::Glonass => write!(f, "GLONASS"),
            Self::Galileo => write!(f, "Galileo"),
            Self::BeiDou => write!(f, "BeiDou"),
            Self::Qzss => write!(f, "QZSS"),
            Self::Irnss => write!(f, "IRNSS"),
            Self::Sbas => write!(f, "SBAS"),
        }
    }
}

/// Satellite identity: constellation plus slot number as written in the file.
///
/// SBAS slots follow the RINEX convention of PRN - 100 (`S20` is PRN 120).
/// Serialized as its display form so it can key JSON maps.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SatId {
    pub constellation: Constellation,
    pub prn: u16,
}

impl SatId {
    pub const fn new(constellation: Constellation, prn: u16) -> Self {
        Self { constellation, prn }
    }
}

impl fmt::Debug for SatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SatId({})", self)
    }
}

impl fmt::Display for SatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.constellation.rinex_char(), self.prn)
    }
}

impl From<SatId> for String {
    fn from(sat: SatId) -> Self {
        sat.to_string()
    }
}

impl TryFrom<String> for SatId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for SatId {
    type Err = String;

    /// Accepts `G01`, `G 1` and `G1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars
            .next()
            .ok_or_else(|| "empty satellite identifier".to_string())?;
        let constellation = Constellation::from_rinex_char(letter)
            .ok_or_else(|| format!("unknown satellite system in '{}'", s))?;
        let prn = chars
            .as_str()
            .trim()
            .parse::<u16>()
            .map_err(|_| format!("invalid satellite number in '{}'", s))?;
        Ok(Self { constellation, prn })
    }
}

/// Time system of an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeSystem {
    Gpst,
    /// GLONASS broadcast epochs are UTC(SU)
    Utc,
    Gst,
    Bdt,
    Qzsst,
    Irnsst,
}

impl fmt::Display for TimeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::Gpst => "GPS",
            Self::Utc => "UTC",
            Self::Gst => "GAL",
            Self::Bdt => "BDT",
            Self::Qzsst => "QZS",
            Self::Irnsst => "IRN",
        };
        f.write_str(code)
    }
}

/// Calendar epoch in a given time system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Epoch {
    pub time: NaiveDateTime,
    pub system: TimeSystem,
}

/// GPS minus UTC since 2017-01-01.
pub const GPS_UTC_LEAP_SECONDS: i64 = 18;

/// GPS minus BeiDou time.
const GPS_BDT_OFFSET_SECONDS: i64 = 14;

impl Epoch {
    pub fn new(time: NaiveDateTime, system: TimeSystem) -> Self {
        Self { time, system }
    }

    /// The same instant expressed in GPS time.
    ///
    /// Galileo, QZSS and NavIC system times are steered to GPS time and taken
    /// as equal to it. UTC epochs assume the current leap second count.
    pub fn gps_time(&self) -> NaiveDateTime {
        let offset = match self.system {
            TimeSystem::Gpst | TimeSystem::Gst | TimeSystem::Qzsst | TimeSystem::Irnsst => 0,
            TimeSystem::Utc => GPS_UTC_LEAP_SECONDS,
            TimeSystem::Bdt => GPS_BDT_OFFSET_SECONDS,
        };
        self.time + Duration::seconds(offset)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.time.format("%Y-%m-%d %H:%M:%S%.3f"), self.system)
    }
}
