//! Fixed-width column helpers for RINEX text lines.

/// Width of a broadcast orbit value (`D19.12`).
pub(crate) const VALUE_WIDTH: usize = 19;

/// Number of values on a broadcast orbit line.
pub(crate) const VALUES_PER_LINE: usize = 4;

/// Column slice `[start, start + width)`, clipped to the line. Empty when the
/// line ends before `start`.
pub(crate) fn field(line: &str, start: usize, width: usize) -> &str {
    let end = (start + width).min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("")
}

/// Whether the line reaches column `start`.
pub(crate) fn has_column(line: &str, start: usize) -> bool {
    line.trim_end().len() > start
}

/// Parse a Fortran-style float (`D` or `E` exponent). Blank yields `None`.
pub(crate) fn parse_float(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let normalized = trimmed.replace(['D', 'd'], "E");
    normalized
        .parse::<f64>()
        .map(Some)
        .map_err(|_| format!("invalid number '{}'", trimmed))
}

/// Parse an integer field. Blank yields `None`.
pub(crate) fn parse_int(raw: &str) -> Result<Option<i64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| format!("invalid integer '{}'", trimmed))
}

/// Parse up to `count` consecutive `D19.12` values starting at `start`.
///
/// Values past the end of the line are absent; blank values inside the line
/// read as zero.
pub(crate) fn parse_values(line: &str, start: usize, count: usize) -> Result<Vec<f64>, String> {
    let mut values = Vec::with_capacity(count);
    for k in 0..count {
        let col = start + k * VALUE_WIDTH;
        if !has_column(line, col) {
            break;
        }
        let value = parse_float(field(line, col, VALUE_WIDTH))?.unwrap_or(0.0);
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fortran_exponent() {
        assert_eq!(parse_float(" 1.5D-02").unwrap(), Some(0.015));
        assert_eq!(parse_float("-2.0d+01").unwrap(), Some(-20.0));
        assert_eq!(parse_float(" 3.0E+00").unwrap(), Some(3.0));
        assert_eq!(parse_float("    ").unwrap(), None);
        assert!(parse_float("1.2X-05").is_err());
    }

    #[test]
    fn test_values_run_together() {
        // Negative values fill the whole column, no separating blank.
        let line = "    -1.000000000000D+00-2.000000000000D+00 3.000000000000D+00";
        let values = parse_values(line, 4, VALUES_PER_LINE).unwrap();
        assert_eq!(values, vec![-1.0, -2.0, 3.0]);
    }

    #[test]
    fn test_blank_value_inside_line_is_zero() {
        let line = format!("    {:19} 2.000000000000E+00", "");
        let values = parse_values(&line, 4, VALUES_PER_LINE).unwrap();
        assert_eq!(values, vec![0.0, 2.0]);
    }

    #[test]
    fn test_field_clips_short_lines() {
        assert_eq!(field("abc", 1, 10), "bc");
        assert_eq!(field("abc", 5, 2), "");
    }

    proptest! {
        #[test]
        fn test_formatted_values_parse_back(v in -1.0e9f64..1.0e9) {
            let text = format!("{:.12E}", v).replace('E', "D");
            let parsed = parse_float(&text).unwrap().unwrap();
            let tolerance = v.abs() * 1e-11 + 1e-300;
            prop_assert!((parsed - v).abs() <= tolerance);
        }
    }
}
