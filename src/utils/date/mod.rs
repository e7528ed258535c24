// Date utility functions
// Formatting helpers shared by the offset catalog, alert bodies and the widget

use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Short numeric date plus short time, e.g. `1/5/25, 3:30 PM`.
pub fn format_short_date_time<Tz>(date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    date.format("%-m/%-d/%y, %-I:%M %p").to_string()
}

/// Parse an RFC 3339 timestamp, or a `YYYY-MM-DDTHH:MM` / `YYYY-MM-DD HH:MM`
/// wall-clock time in the local zone.
pub fn parse_date_time(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Ok(date.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(|| format!("Invalid date/time '{}'", input))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|date| date.with_timezone(&Utc))
        .ok_or_else(|| format!("'{}' does not exist in the local time zone", input))
}

fn unit(count: u64, name: &str) -> String {
    format!("{} {}{}", count, name, if count == 1 { "" } else { "s" })
}

/// Humanize a span of seconds using at most its two largest non-zero units.
///
/// Whole days are reported as days ("3 days"), which keeps the catalog
/// offsets readable; anything shorter falls back to hours, minutes and
/// seconds ("1 hour 15 minutes", "45 seconds").
pub fn humanize_seconds(total: u64) -> String {
    if total == 0 {
        return unit(0, "minute");
    }

    let days = total / SECONDS_PER_DAY;
    let hours = (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total % SECONDS_PER_MINUTE;

    let parts: Vec<String> = [
        (days, "day"),
        (hours, "hour"),
        (minutes, "minute"),
        (seconds, "second"),
    ]
    .into_iter()
    .skip_while(|(count, _)| *count == 0)
    .take(2)
    .filter(|(count, _)| *count > 0)
    .map(|(count, name)| unit(count, name))
    .collect();

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, "0 minutes" ; "zero")]
    #[test_case(45, "45 seconds" ; "seconds only")]
    #[test_case(30 * 60, "30 minutes" ; "half hour")]
    #[test_case(3600, "1 hour" ; "singular hour")]
    #[test_case(4500, "1 hour 15 minutes" ; "hour and minutes")]
    #[test_case(12 * 3600, "12 hours" ; "twelve hours")]
    #[test_case(86400, "1 day" ; "one day")]
    #[test_case(3 * 86400, "3 days" ; "three days")]
    #[test_case(86400 + 60, "1 day" ; "drops third unit gap")]
    #[test_case(2 * 86400 + 5 * 3600 + 59, "2 days 5 hours" ; "two largest units")]
    fn test_humanize_seconds(seconds: u64, expected: &str) {
        assert_eq!(humanize_seconds(seconds), expected);
    }

    #[test]
    fn test_format_short_date_time() {
        let date = Utc.with_ymd_and_hms(2025, 1, 5, 15, 30, 0).unwrap();
        assert_eq!(format_short_date_time(&date), "1/5/25, 3:30 PM");
    }

    #[test]
    fn test_format_short_date_time_morning() {
        let date = Utc.with_ymd_and_hms(2025, 11, 24, 9, 5, 0).unwrap();
        assert_eq!(format_short_date_time(&date), "11/24/25, 9:05 AM");
    }

    #[test]
    fn test_parse_date_time_rfc3339() {
        let parsed = parse_date_time("2025-01-05T15:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 5, 13, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_date_time_local_wall_clock() {
        let parsed = parse_date_time("2025-06-01T09:15").unwrap();
        assert_eq!(parsed.with_timezone(&Local).format("%H:%M").to_string(), "09:15");
    }

    #[test]
    fn test_parse_date_time_rejects_garbage() {
        assert!(parse_date_time("next tuesday").is_err());
    }
}
