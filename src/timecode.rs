//! Time token parsing.
//!
//! Accepts plain seconds (`"12.5"`), `minutes:seconds` (`"1:06"`) and
//! `hours:minutes:seconds` (`"1:02:03"`). Every part may carry a fraction.

use crate::error::CutError;

/// Parse a time token into seconds.
pub fn parse_time(token: &str) -> Result<f64, CutError> {
    let trimmed = token.trim();
    if !trimmed.contains(':') {
        return parse_part(trimmed, token);
    }

    let parts = trimmed
        .split(':')
        .map(|part| parse_part(part, token))
        .collect::<Result<Vec<_>, _>>()?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0.0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(CutError::format(token)),
    };

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Parse an optional token, mapping `None` to `None`.
pub fn parse_optional(token: Option<&str>) -> Result<Option<f64>, CutError> {
    token.map(parse_time).transpose()
}

fn parse_part(part: &str, token: &str) -> Result<f64, CutError> {
    let value: f64 = part.trim().parse().map_err(|_| CutError::format(token))?;
    if !value.is_finite() || value < 0.0 {
        return Err(CutError::format(token));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_seconds() {
        assert_eq!(parse_time("12.5").unwrap(), 12.5);
        assert_eq!(parse_time("0").unwrap(), 0.0);
        assert_eq!(parse_time("39").unwrap(), 39.0);
    }

    #[test]
    fn parses_minutes_and_seconds() {
        assert_eq!(parse_time("1:06").unwrap(), 66.0);
        assert_eq!(parse_time("00:39").unwrap(), 39.0);
        assert_eq!(parse_time("2:30.5").unwrap(), 150.5);
    }

    #[test]
    fn parses_hours_minutes_seconds() {
        assert_eq!(parse_time("1:02:03").unwrap(), 3723.0);
        assert_eq!(parse_time("0:0:1.25").unwrap(), 1.25);
    }

    #[test]
    fn rejects_wrong_part_count() {
        assert!(matches!(
            parse_time("1:2:3:4"),
            Err(CutError::Format { token }) if token == "1:2:3:4"
        ));
    }

    #[test]
    fn rejects_non_numeric_parts() {
        assert!(matches!(parse_time("abc"), Err(CutError::Format { .. })));
        assert!(matches!(parse_time("1:xx"), Err(CutError::Format { .. })));
        assert!(matches!(parse_time("1:"), Err(CutError::Format { .. })));
        assert!(matches!(parse_time(""), Err(CutError::Format { .. })));
    }

    #[test]
    fn rejects_negative_and_non_finite_values() {
        assert!(parse_time("-3").is_err());
        assert!(parse_time("1:-3").is_err());
        assert!(parse_time("inf").is_err());
        assert!(parse_time("NaN").is_err());
    }

    #[test]
    fn optional_tokens_pass_through_absence() {
        assert_eq!(parse_optional(None).unwrap(), None);
        assert_eq!(parse_optional(Some("1:00")).unwrap(), Some(60.0));
    }
}
