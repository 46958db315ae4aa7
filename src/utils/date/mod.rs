// Date utility functions
// Duration rendering and timestamp parsing shared by the status engine and the CLI

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const UNITS: [(i64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Renders the two largest non-zero units of `duration`, e.g. `2d 3h` or `45s`.
/// Zero, sub-second and negative durations render as `0s`.
pub fn format_two_units(duration: Duration) -> String {
    let mut remaining = duration.num_seconds().max(0);
    let mut parts = Vec::with_capacity(2);

    for (size, suffix) in UNITS {
        let value = remaining / size;
        remaining %= size;
        if value > 0 {
            parts.push(format!("{}{}", value, suffix));
            if parts.len() == 2 {
                break;
            }
        }
    }

    if parts.is_empty() {
        return "0s".to_string();
    }

    parts.join(" ")
}

/// Parses a provider timestamp. RFC 3339 values keep their offset; values
/// without an offset (`2025-03-01T12:00:00`) are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Formats an instant for display, in `tz` when given, otherwise in local time.
pub fn format_instant(instant: DateTime<Utc>, tz: Option<Tz>) -> String {
    const FORMAT: &str = "%Y-%m-%d %H:%M";
    match tz {
        Some(tz) => instant.with_timezone(&tz).format(FORMAT).to_string(),
        None => instant.with_timezone(&Local).format(FORMAT).to_string(),
    }
}

/// Serde adapter for provider timestamps, see [`parse_timestamp`].
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Duration::days(2) + Duration::hours(3) + Duration::minutes(4), "2d 3h"; "days and hours")]
    #[test_case(Duration::days(2) + Duration::minutes(5), "2d 5m"; "skips zero hours")]
    #[test_case(Duration::hours(1) + Duration::seconds(9), "1h 9s"; "hours and seconds")]
    #[test_case(Duration::minutes(30), "30m"; "single unit")]
    #[test_case(Duration::seconds(45), "45s"; "under a minute")]
    #[test_case(Duration::milliseconds(900), "0s"; "sub second")]
    #[test_case(Duration::zero(), "0s"; "zero")]
    #[test_case(Duration::seconds(-30), "0s"; "negative clamps")]
    fn test_format_two_units(duration: Duration, expected: &str) {
        assert_eq!(format_two_units(duration), expected);
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let parsed = parse_timestamp("2025-03-01T14:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_without_offset_is_utc() {
        let parsed = parse_timestamp("2025-03-01T12:00:00.250").unwrap();
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + Duration::milliseconds(250)
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_format_instant_in_named_zone() {
        let instant = Utc.with_ymd_and_hms(2025, 7, 1, 10, 30, 0).unwrap();
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        assert_eq!(format_instant(instant, Some(tz)), "2025-07-01 12:30");
    }
}
