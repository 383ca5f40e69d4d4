//! Text form of envelope timestamps.
//!
//! Written as `2015-11-06T15:23:03.000000[UTC]`. Reading also accepts RFC
//! 3339 offsets and a bare `2015-11-06T15:23:03`, which is taken as UTC.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

use crate::error::DomainError;

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Formats a timestamp in canonical form.
#[must_use]
pub fn format(timestamp: &DateTime<Utc>) -> String {
    format!("{}[UTC]", timestamp.format("%Y-%m-%dT%H:%M:%S%.6f"))
}

/// Parses any accepted timestamp form.
///
/// # Errors
///
/// Returns `DomainError::Validation` for unparseable text or a bracketed
/// zone other than `UTC`.
pub fn parse(value: &str) -> Result<DateTime<Utc>, DomainError> {
    let value = value.trim();
    if let Some(body) = value.strip_suffix(']') {
        let (local, zone) = body
            .split_once('[')
            .ok_or_else(|| invalid(value, "unbalanced zone annotation"))?;
        if !zone.eq_ignore_ascii_case("UTC") {
            return Err(invalid(value, "only the UTC zone is supported"));
        }
        return parse_naive(local).ok_or_else(|| invalid(value, "malformed date/time"));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    parse_naive(value).ok_or_else(|| invalid(value, "malformed date/time"))
}

/// Truncates to the microsecond precision the text form carries.
#[must_use]
pub fn truncate(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(6)
}

fn parse_naive(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, NAIVE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn invalid(value: &str, reason: &str) -> DomainError {
    DomainError::Validation(format!("invalid timestamp {value:?}: {reason}"))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};

    use super::*;

    #[test]
    fn test_format_writes_microseconds_and_zone() {
        let ts = Utc.with_ymd_and_hms(2015, 11, 6, 15, 23, 3).unwrap();
        assert_eq!(format(&ts), "2015-11-06T15:23:03.000000[UTC]");
    }

    #[test]
    fn test_parse_accepts_every_supported_form() {
        let expected = Utc.with_ymd_and_hms(2015, 11, 6, 15, 23, 3).unwrap();

        assert_eq!(parse("2015-11-06T15:23:03").unwrap(), expected);
        assert_eq!(parse("2015-11-06T15:23:03.000000[UTC]").unwrap(), expected);
        assert_eq!(parse("2015-11-06T15:23:03Z").unwrap(), expected);
        assert_eq!(parse("2015-11-06T09:23:03-06:00").unwrap(), expected);
    }

    #[test]
    fn test_parse_keeps_fractional_seconds() {
        let parsed = parse("2015-11-06T15:23:03.123456[UTC]").unwrap();
        assert_eq!(parsed.nanosecond(), 123_456_000);
    }

    #[test]
    fn test_parse_rejects_other_zones_and_garbage() {
        assert!(parse("2015-11-06T15:23:03.000000[America/Chicago]").is_err());
        assert!(parse("yesterday").is_err());
        assert!(parse("2015-11-06T15:23:03]").is_err());
    }

    #[test]
    fn test_truncate_drops_nanoseconds() {
        let ts = Utc
            .with_ymd_and_hms(2026, 1, 15, 10, 0, 0)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();
        assert_eq!(truncate(ts).nanosecond(), 123_456_000);
        assert_eq!(parse(&format(&truncate(ts))).unwrap(), truncate(ts));
    }
}
