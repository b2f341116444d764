//! Version dispatch.
//!
//! The header's `RINEX VERSION / TYPE` line selects a [`NavFormat`]. Each
//! variant knows where a message starts, how the satellite and epoch are laid
//! out on the first line and at which column the broadcast orbit values begin.
//! Turning the values into an ephemeris is shared by all versions (see
//! `record::assemble`).

use super::error::RinexError;
use super::fields::{field, parse_float, parse_int, parse_values, VALUES_PER_LINE};
use crate::gnss::types::{Constellation, SatId};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// `major.minor` version from the header, e.g. 3.03.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RinexVersion {
    pub major: u8,
    pub minor: u8,
}

impl RinexVersion {
    /// Parse the `F9.2` version field.
    pub fn parse(raw: &str) -> Result<Self, RinexError> {
        let trimmed = raw.trim();
        let unsupported =
            || RinexError::UnsupportedFormat(format!("invalid version '{}'", trimmed));
        let (major, minor) = match trimmed.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (trimmed, "0"),
        };
        let major = major.parse::<u8>().map_err(|_| unsupported())?;
        let minor = if minor.is_empty() {
            0
        } else {
            minor.parse::<u8>().map_err(|_| unsupported())?
        };
        Ok(Self { major, minor })
    }
}

impl fmt::Display for RinexVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

/// First line of a message, split into its parts.
#[derive(Debug, Clone)]
pub(crate) struct RecordStart {
    pub sat: SatId,
    pub toc: NaiveDateTime,
    /// Clock values on the first line (bias, drift, drift rate)
    pub values: Vec<f64>,
}

/// Per-version line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavFormat {
    /// RINEX 2.xx: one constellation per file, chosen by the file type letter.
    V2 { constellation: Constellation },
    /// RINEX 3.xx: the satellite system letter leads every message.
    V3,
}

impl NavFormat {
    /// Select the layout for a version and the header's type/system letters.
    pub fn select(
        version: RinexVersion,
        file_type: char,
        system: char,
    ) -> Result<(Self, Option<Constellation>), RinexError> {
        match version.major {
            2 => {
                let constellation = match file_type {
                    'N' => Constellation::Gps,
                    'G' => Constellation::Glonass,
                    'H' => Constellation::Sbas,
                    other => {
                        return Err(RinexError::UnsupportedFormat(format!(
                            "RINEX {} file type '{}' is not a navigation file",
                            version, other
                        )))
                    }
                };
                Ok((NavFormat::V2 { constellation }, Some(constellation)))
            }
            3 => {
                if !matches!(file_type, 'N' | 'G' | 'H') {
                    return Err(RinexError::UnsupportedFormat(format!(
                        "RINEX {} file type '{}' is not a navigation file",
                        version, file_type
                    )));
                }
                let constellation = match system {
                    'M' => None,
                    ' ' => Some(match file_type {
                        'G' => Constellation::Glonass,
                        'H' => Constellation::Sbas,
                        _ => Constellation::Gps,
                    }),
                    c => Some(Constellation::from_rinex_char(c).ok_or_else(|| {
                        RinexError::UnsupportedFormat(format!("unknown satellite system '{}'", c))
                    })?),
                };
                Ok((NavFormat::V3, constellation))
            }
            _ => Err(RinexError::UnsupportedFormat(format!(
                "RINEX {} navigation files are not supported",
                version
            ))),
        }
    }

    /// Column where values start on the first line of a message.
    fn first_line_values_at(&self) -> usize {
        match self {
            NavFormat::V2 { .. } => 22,
            NavFormat::V3 => 23,
        }
    }

    /// Column where values start on a broadcast orbit line.
    fn continuation_values_at(&self) -> usize {
        match self {
            NavFormat::V2 { .. } => 3,
            NavFormat::V3 => 4,
        }
    }

    /// Whether the line opens a new message.
    pub(crate) fn is_record_start(&self, line: &str) -> bool {
        match self {
            NavFormat::V2 { .. } => !field(line, 0, 2).trim().is_empty(),
            NavFormat::V3 => line.chars().next().is_some_and(|c| !c.is_whitespace()),
        }
    }

    /// Satellite of a message from its first line.
    pub(crate) fn parse_sat(&self, line: &str) -> Result<SatId, String> {
        match self {
            NavFormat::V2 { constellation } => {
                let prn = parse_int(field(line, 0, 2))?.ok_or("missing satellite number")?;
                Ok(SatId::new(*constellation, to_prn(prn)?))
            }
            NavFormat::V3 => field(line, 0, 3).parse(),
        }
    }

    /// Split the first line of a message.
    pub(crate) fn parse_record_start(&self, line: &str) -> Result<RecordStart, String> {
        let (sat, toc) = match self {
            NavFormat::V2 { constellation } => {
                let sat = self.parse_sat(line)?;
                let year = parse_int(field(line, 3, 2))?.ok_or("missing year")?;
                let year = if year < 80 { 2000 + year } else { 1900 + year };
                let toc = epoch(
                    year,
                    int_field(line, 6, 2, "month")?,
                    int_field(line, 9, 2, "day")?,
                    int_field(line, 12, 2, "hour")?,
                    int_field(line, 15, 2, "minute")?,
                    parse_float(field(line, 17, 5))?.ok_or("missing second")?,
                )?;
                (sat, toc)
            }
            NavFormat::V3 => {
                let sat = self.parse_sat(line)?;
                let toc = epoch(
                    int_field(line, 4, 4, "year")?,
                    int_field(line, 9, 2, "month")?,
                    int_field(line, 12, 2, "day")?,
                    int_field(line, 15, 2, "hour")?,
                    int_field(line, 18, 2, "minute")?,
                    int_field(line, 21, 2, "second")? as f64,
                )?;
                (sat, toc)
            }
        };
        let values = parse_values(line, self.first_line_values_at(), 3)?;
        Ok(RecordStart { sat, toc, values })
    }

    /// Values of a broadcast orbit line.
    pub(crate) fn parse_orbit_line(&self, line: &str) -> Result<Vec<f64>, String> {
        parse_values(line, self.continuation_values_at(), VALUES_PER_LINE)
    }
}

fn int_field(line: &str, start: usize, width: usize, name: &str) -> Result<i64, String> {
    parse_int(field(line, start, width))?.ok_or_else(|| format!("missing {}", name))
}

fn to_prn(value: i64) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("invalid satellite number {}", value))
}

fn epoch(
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: f64,
) -> Result<NaiveDateTime, String> {
    let invalid = || {
        format!(
            "invalid epoch {:04}-{:02}-{:02} {:02}:{:02}:{:04.1}",
            year, month, day, hour, minute, second
        )
    };
    if !(0.0..61.0).contains(&second) {
        return Err(invalid());
    }
    let whole = second.trunc() as u32;
    let nanos = ((second - second.trunc()) * 1e9).round() as u32;
    let date = NaiveDate::from_ymd_opt(
        i32::try_from(year).map_err(|_| invalid())?,
        u32::try_from(month).map_err(|_| invalid())?,
        u32::try_from(day).map_err(|_| invalid())?,
    )
    .ok_or_else(invalid)?;
    date.and_hms_nano_opt(
        u32::try_from(hour).map_err(|_| invalid())?,
        u32::try_from(minute).map_err(|_| invalid())?,
        whole,
        nanos,
    )
    .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_version_parse() {
        assert_eq!(
            RinexVersion::parse("     3.03").unwrap(),
            RinexVersion { major: 3, minor: 3 }
        );
        assert_eq!(
            RinexVersion::parse("2.11").unwrap(),
            RinexVersion { major: 2, minor: 11 }
        );
        assert!(RinexVersion::parse("three").is_err());
        assert_eq!(RinexVersion { major: 3, minor: 3 }.to_string(), "3.03");
    }

    #[test]
    fn test_select_rejects_other_majors() {
        let v4 = RinexVersion { major: 4, minor: 0 };
        assert!(matches!(
            NavFormat::select(v4, 'N', 'M'),
            Err(RinexError::UnsupportedFormat(_))
        ));
        let obs = RinexVersion { major: 3, minor: 3 };
        assert!(NavFormat::select(obs, 'O', 'G').is_err());
    }

    #[test]
    fn test_select_v2_file_types() {
        let v2 = RinexVersion { major: 2, minor: 11 };
        let (format, system) = NavFormat::select(v2, 'G', ' ').unwrap();
        assert_eq!(
            format,
            NavFormat::V2 {
                constellation: Constellation::Glonass
            }
        );
        assert_eq!(system, Some(Constellation::Glonass));
    }

    #[test]
    fn test_v3_record_start() {
        let line = "G05 2022 06 01 12 00 00-1.234567890123E-04 1.000000000000E-11 0.000000000000E+00";
        let start = NavFormat::V3.parse_record_start(line).unwrap();
        assert_eq!(start.sat.to_string(), "G05");
        assert_eq!(start.toc.hour(), 12);
        assert_eq!(start.values.len(), 3);
        assert!((start.values[0] + 1.234567890123e-4).abs() < 1e-16);
    }

    #[test]
    fn test_v2_record_start_two_digit_year() {
        let line = " 7 22  6  1 12  0 30.0-1.234567890123D-04 1.000000000000D-11 0.000000000000D+00";
        let format = NavFormat::V2 {
            constellation: Constellation::Gps,
        };
        assert!(format.is_record_start(line));
        let start = format.parse_record_start(line).unwrap();
        assert_eq!(start.sat.to_string(), "G07");
        assert_eq!(start.toc.format("%Y").to_string(), "2022");
        assert_eq!(start.toc.second(), 30);
    }

    #[test]
    fn test_v2_continuation_is_not_a_start() {
        let format = NavFormat::V2 {
            constellation: Constellation::Gps,
        };
        assert!(!format.is_record_start("    1.000000000000D+00"));
        assert!(!NavFormat::V3.is_record_start("     1.000000000000E+00"));
    }

    #[test]
    fn test_invalid_epoch_is_rejected() {
        let line = "G05 2022 13 01 12 00 00 0.000000000000E+00 0.000000000000E+00 0.000000000000E+00";
        let err = NavFormat::V3.parse_record_start(line).unwrap_err();
        assert!(err.contains("invalid epoch"));
    }
}
