//! Navigation file header.

use super::decoder::LineReader;
use super::error::{ParseWarning, RinexError};
use super::fields::{field, parse_float, parse_int};
use super::version::{NavFormat, RinexVersion};
use crate::gnss::nav_info::{GnssNavInfo, IonosphericCorrection, TimeSystemCorrection};
use crate::gnss::types::Constellation;
use std::io::BufRead;

const LABEL_START: usize = 60;

/// Parsed header of a navigation file.
#[derive(Debug, Clone)]
pub struct NavHeader {
    pub version: RinexVersion,
    pub format: NavFormat,
    /// Declared satellite system, `None` for mixed files
    pub constellation: Option<Constellation>,
    pub program: Option<String>,
    pub run_by: Option<String>,
    pub date: Option<String>,
    pub comments: Vec<String>,
    pub ionospheric_corrections: Vec<IonosphericCorrection>,
    pub time_system_corrections: Vec<TimeSystemCorrection>,
    pub leap_seconds: Option<i32>,
}

impl NavHeader {
    /// Read header lines up to and including `END OF HEADER`.
    ///
    /// Lines that carry a known label but unreadable values are skipped and
    /// reported as warnings.
    pub(crate) fn parse<R: BufRead>(
        lines: &mut LineReader<R>,
    ) -> Result<(Self, Vec<ParseWarning>), RinexError> {
        let (line_no, first) = lines.next_line()?.ok_or(RinexError::MalformedHeader {
            line: 0,
            message: "empty file".into(),
        })?;
        if label(&first) != "RINEX VERSION / TYPE" {
            return Err(RinexError::MalformedHeader {
                line: line_no,
                message: "first line is not RINEX VERSION / TYPE".into(),
            });
        }
        let version = RinexVersion::parse(field(&first, 0, 9))?;
        let file_type = char_at(&first, 20);
        let system = char_at(&first, 40);
        let (format, constellation) = NavFormat::select(version, file_type, system)?;

        let mut header = NavHeader {
            version,
            format,
            constellation,
            program: None,
            run_by: None,
            date: None,
            comments: Vec::new(),
            ionospheric_corrections: Vec::new(),
            time_system_corrections: Vec::new(),
            leap_seconds: None,
        };
        let mut warnings = Vec::new();
        let mut last_line = line_no;

        loop {
            let Some((line_no, line)) = lines.next_line()? else {
                return Err(RinexError::MalformedHeader {
                    line: last_line,
                    message: "missing END OF HEADER".into(),
                });
            };
            last_line = line_no;
            let label = label(&line);
            if label == "END OF HEADER" {
                break;
            }
            if let Err(message) = header.apply(label, &line) {
                warnings.push(ParseWarning {
                    line: line_no,
                    sat: None,
                    message: format!("ignored {}: {}", label, message),
                });
            }
        }

        tracing::debug!(
            "RINEX {} navigation header parsed ({} corrections, leap seconds {:?})",
            header.version,
            header.ionospheric_corrections.len() + header.time_system_corrections.len(),
            header.leap_seconds
        );
        Ok((header, warnings))
    }

    fn apply(&mut self, label: &str, line: &str) -> Result<(), String> {
        match label {
            "PGM / RUN BY / DATE" => {
                self.program = text(line, 0, 20);
                self.run_by = text(line, 20, 20);
                self.date = text(line, 40, 20);
            }
            "COMMENT" => self.comments.push(field(line, 0, LABEL_START).trim_end().to_string()),
            "LEAP SECONDS" => {
                let leap = parse_int(field(line, 0, 6))?.ok_or("missing value")?;
                self.leap_seconds = Some(i32::try_from(leap).map_err(|_| "out of range")?);
            }
            "IONOSPHERIC CORR" => {
                let kind = field(line, 0, 4).trim().to_string();
                let coefficients = coefficients(line, 5)?;
                self.ionospheric_corrections
                    .push(IonosphericCorrection { kind, coefficients });
            }
            "ION ALPHA" | "ION BETA" => {
                let kind = if label == "ION ALPHA" { "GPSA" } else { "GPSB" };
                let coefficients = coefficients(line, 2)?;
                self.ionospheric_corrections.push(IonosphericCorrection {
                    kind: kind.to_string(),
                    coefficients,
                });
            }
            "TIME SYSTEM CORR" => {
                let kind = field(line, 0, 4).trim().to_string();
                self.push_correction(kind, line, [(5, 17), (22, 16), (38, 7), (45, 5)])?;
            }
            "DELTA-UTC: A0,A1,T,W" => {
                self.push_correction("GPUT".into(), line, [(3, 19), (22, 19), (41, 9), (50, 9)])?;
            }
            "D-UTC A0,A1,T,W,S,U" => {
                self.push_correction("SBUT".into(), line, [(0, 19), (19, 19), (38, 9), (47, 9)])?;
            }
            "CORR TO SYSTEM TIME" => {
                let tau = parse_float(field(line, 21, 19))?.ok_or("missing value")?;
                self.time_system_corrections.push(TimeSystemCorrection {
                    kind: "GLUT".into(),
                    a0: tau,
                    a1: 0.0,
                    reference_time: 0,
                    reference_week: 0,
                });
            }
            _ => {}
        }
        Ok(())
    }

    /// Push a correction read from `(start, width)` columns of a0, a1, T, W.
    fn push_correction(
        &mut self,
        kind: String,
        line: &str,
        columns: [(usize, usize); 4],
    ) -> Result<(), String> {
        let [a0, a1, t, w] = columns;
        let number = |(start, width): (usize, usize)| -> Result<f64, String> {
            parse_float(field(line, start, width))?.ok_or_else(|| "missing value".to_string())
        };
        self.time_system_corrections.push(TimeSystemCorrection {
            kind,
            a0: number(a0)?,
            a1: number(a1)?,
            reference_time: number(t)? as i64,
            reference_week: number(w)? as i64,
        });
        Ok(())
    }

    /// Header-level content as an otherwise empty store.
    pub fn to_nav_info(&self) -> GnssNavInfo {
        let mut info = GnssNavInfo::new();
        info.satellite_systems.extend(self.constellation);
        info.ionospheric_corrections = self.ionospheric_corrections.clone();
        info.time_system_corrections = self.time_system_corrections.clone();
        info.leap_seconds = self.leap_seconds;
        info
    }
}

fn label(line: &str) -> &str {
    field(line, LABEL_START, 20).trim()
}

fn char_at(line: &str, col: usize) -> char {
    field(line, col, 1).chars().next().unwrap_or(' ')
}

fn text(line: &str, start: usize, width: usize) -> Option<String> {
    let value = field(line, start, width).trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Four `D12.4` coefficients; a blank fourth slot (Galileo) reads as zero.
fn coefficients(line: &str, start: usize) -> Result<[f64; 4], String> {
    let mut out = [0.0; 4];
    for (k, slot) in out.iter_mut().enumerate() {
        *slot = parse_float(field(line, start + 12 * k, 12))?.unwrap_or(0.0);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_line(content: &str, label: &str) -> String {
        format!("{:<60}{:<20}\n", content, label)
    }

    fn parse(text: &str) -> Result<(NavHeader, Vec<ParseWarning>), RinexError> {
        let mut lines = LineReader::new(Cursor::new(text.to_string()));
        NavHeader::parse(&mut lines)
    }

    #[test]
    fn test_v3_header_corrections() {
        let mut text = header_line(
            "     3.03           N: GNSS NAV DATA    G: GPS",
            "RINEX VERSION / TYPE",
        );
        text += &header_line(
            "GPSA   1.1176D-08  7.4506D-09 -5.9605D-08 -5.9605D-08",
            "IONOSPHERIC CORR",
        );
        text += &header_line(
            "GPUT -9.3132257462D-10-1.776356839D-15 319488 2212",
            "TIME SYSTEM CORR",
        );
        text += &header_line("    18", "LEAP SECONDS");
        text += &header_line("", "END OF HEADER");

        let (header, warnings) = parse(&text).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(header.format, NavFormat::V3);
        assert_eq!(header.constellation, Some(Constellation::Gps));
        assert_eq!(header.ionospheric_corrections[0].kind, "GPSA");
        assert!((header.ionospheric_corrections[0].coefficients[0] - 1.1176e-8).abs() < 1e-15);
        let corr = &header.time_system_corrections[0];
        assert_eq!(corr.kind, "GPUT");
        assert_eq!(corr.reference_time, 319488);
        assert_eq!(corr.reference_week, 2212);
        assert_eq!(header.leap_seconds, Some(18));

        let info = header.to_nav_info();
        assert!(info.is_empty());
        assert!(info.satellite_systems.contains(&Constellation::Gps));
    }

    #[test]
    fn test_v2_header_ion_and_delta_utc() {
        let mut text = header_line("     2.11           N: GPS NAV DATA", "RINEX VERSION / TYPE");
        text += &header_line(
            "    0.1118D-07  0.7451D-08 -0.5960D-07 -0.5960D-07",
            "ION ALPHA",
        );
        text += &header_line(
            "   -0.931322574615D-09-0.177635683940D-14   319488     2212",
            "DELTA-UTC: A0,A1,T,W",
        );
        text += &header_line("", "END OF HEADER");

        let (header, _) = parse(&text).unwrap();
        assert_eq!(
            header.format,
            NavFormat::V2 {
                constellation: Constellation::Gps
            }
        );
        assert_eq!(header.ionospheric_corrections[0].kind, "GPSA");
        assert_eq!(header.time_system_corrections[0].kind, "GPUT");
        assert_eq!(header.time_system_corrections[0].reference_week, 2212);
    }

    #[test]
    fn test_bad_correction_line_is_a_warning() {
        let mut text = header_line(
            "     3.04           N: GNSS NAV DATA    M: MIXED",
            "RINEX VERSION / TYPE",
        );
        text += &header_line("GAL    2.XXXXD+01", "IONOSPHERIC CORR");
        text += &header_line("", "END OF HEADER");

        let (header, warnings) = parse(&text).unwrap();
        assert_eq!(header.constellation, None);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 2);
        assert!(header.ionospheric_corrections.is_empty());
    }

    #[test]
    fn test_missing_end_of_header() {
        let text = header_line(
            "     3.03           N: GNSS NAV DATA    G: GPS",
            "RINEX VERSION / TYPE",
        );
        assert!(matches!(
            parse(&text),
            Err(RinexError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn test_first_line_must_be_version() {
        let text = header_line("converted", "COMMENT");
        assert!(matches!(
            parse(&text),
            Err(RinexError::MalformedHeader { line: 1, .. })
        ));
        assert!(matches!(parse(""), Err(RinexError::MalformedHeader { .. })));
    }

    #[test]
    fn test_rinex4_is_unsupported() {
        let text = header_line(
            "     4.00           N: GNSS NAV DATA    M: MIXED",
            "RINEX VERSION / TYPE",
        );
        assert!(matches!(parse(&text), Err(RinexError::UnsupportedFormat(_))));
    }
}
