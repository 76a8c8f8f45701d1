use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Wall-clock input pair as collected by date/time form widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInput {
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM
    pub time: String,
}

/// Human-readable rendering of an instant in a target zone.
/// Presentation only; not round-trippable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayDateTime {
    /// MM/DD/YYYY
    pub date: String,
    /// hh:mm AM/PM with zone abbreviation, e.g. "02:30 PM EST"
    pub time: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateTimeError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("unknown timezone '{0}'")]
    UnknownTimeZone(String),

    #[error("local time {0} does not exist in {1} (DST gap)")]
    NonexistentLocalTime(String, Tz),

    #[error("local time {0} is ambiguous in {1} (DST overlap)")]
    AmbiguousLocalTime(String, Tz),
}

pub type Result<T> = std::result::Result<T, DateTimeError>;

/// Resolve the process's local IANA zone from the `TZ` environment variable.
/// Falls back to UTC when unset or unrecognized, so callers have no error
/// path; tests override by setting `TZ`.
#[allow(dead_code)]
pub fn resolve_local_time_zone() -> Tz {
    std::env::var("TZ")
        .ok()
        .and_then(|name| name.parse().ok())
        .unwrap_or(Tz::UTC)
}

/// Parse an IANA timezone identifier against the compiled tzdb.
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| DateTimeError::UnknownTimeZone(name.to_string()))
}

/// True if the identifier is recognized by the timezone database.
#[allow(dead_code)]
pub fn is_valid_time_zone(name: &str) -> bool {
    parse_time_zone(name).is_ok()
}

/// Interpret a wall-clock date+time pair as local time in `zone` and return
/// the equivalent UTC instant for storage.
///
/// Conversion goes through the tzdb, never through fixed-offset arithmetic.
/// A local time swallowed by a DST gap or duplicated by a DST overlap is an
/// error rather than a silently picked side.
pub fn local_input_to_utc(date_str: &str, time_str: &str, zone: Tz) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| DateTimeError::InvalidDate(date_str.to_string()))?;
    let time = NaiveTime::parse_from_str(time_str, "%H:%M")
        .map_err(|_| DateTimeError::InvalidTime(time_str.to_string()))?;

    let naive = date.and_time(time);
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => Err(DateTimeError::NonexistentLocalTime(
            naive.to_string(),
            zone,
        )),
        LocalResult::Ambiguous(_, _) => {
            Err(DateTimeError::AmbiguousLocalTime(naive.to_string(), zone))
        }
    }
}

/// Inverse of [`local_input_to_utc`]: project a stored UTC instant into
/// `zone` and render it back as form-widget input strings.
pub fn utc_to_local_input(instant: DateTime<Utc>, zone: Tz) -> LocalInput {
    let local = instant.with_timezone(&zone);
    LocalInput {
        date: local.format("%Y-%m-%d").to_string(),
        time: local.format("%H:%M").to_string(),
    }
}

/// Locale-style rendering for list rows and exports.
pub fn format_for_display(instant: DateTime<Utc>, zone: Tz) -> DisplayDateTime {
    let local = instant.with_timezone(&zone);
    DisplayDateTime {
        date: local.format("%m/%d/%Y").to_string(),
        time: local.format("%I:%M %p %Z").to_string(),
    }
}

/// First valid instant of the local calendar day. A DST jump can swallow
/// midnight outright (e.g. America/Santiago), so probe forward in
/// half-hour steps until the zone resolves.
fn local_day_start(date: NaiveDate, zone: Tz) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).expect("midnight always exists");
    for step in 0..=4 {
        let naive = midnight + Duration::minutes(30 * step);
        match zone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => return dt.with_timezone(&Utc),
            LocalResult::Ambiguous(first, _) => return first.with_timezone(&Utc),
            LocalResult::None => continue,
        }
    }
    // Unreachable for any real tzdb zone; treat the wall clock as UTC.
    Utc.from_utc_datetime(&midnight)
}

/// Inclusive UTC bounds covering one local calendar day in `zone`.
/// Used to expand bare `YYYY-MM-DD` filter values so a query for a day in
/// New York matches the UTC instants stored for that New York day.
pub fn local_day_range(date_str: &str, zone: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| DateTimeError::InvalidDate(date_str.to_string()))?;
    let next = date.succ_opt().ok_or_else(|| {
        DateTimeError::InvalidDate(date_str.to_string())
    })?;

    let start = local_day_start(date, zone);
    let end = local_day_start(next, zone) - Duration::microseconds(1);
    Ok((start, end))
}

/// Inclusive UTC bounds covering one local calendar month in `zone`.
pub fn local_month_range(
    year: i32,
    month: u32,
    zone: Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DateTimeError::InvalidDate(format!("{:04}-{:02}", year, month)))?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| DateTimeError::InvalidDate(format!("{:04}-{:02}", year, month)))?;

    let start = local_day_start(first, zone);
    let end = local_day_start(next_first, zone) - Duration::microseconds(1);
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;
    use chrono_tz::Asia::Tokyo;
    use chrono_tz::Europe::London;

    #[test]
    fn test_local_input_to_utc_ny_winter() {
        // EST is UTC-5
        let utc = local_input_to_utc("2024-01-15", "14:30", New_York).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-01-15T19:30:00+00:00");
    }

    #[test]
    fn test_local_input_to_utc_ny_summer() {
        // EDT is UTC-4
        let utc = local_input_to_utc("2024-07-15", "14:30", New_York).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-07-15T18:30:00+00:00");
    }

    #[test]
    fn test_round_trip_outside_transitions() {
        for (date, time) in [
            ("2024-01-15", "14:30"),
            ("2024-07-04", "00:00"),
            ("2024-12-31", "23:59"),
        ] {
            for zone in [New_York, Tokyo, London, chrono_tz::UTC] {
                let utc = local_input_to_utc(date, time, zone).unwrap();
                let back = utc_to_local_input(utc, zone);
                assert_eq!(back.date, date, "{} {} in {}", date, time, zone);
                assert_eq!(back.time, time, "{} {} in {}", date, time, zone);
            }
        }
    }

    #[test]
    fn test_rezoning_same_instant() {
        // Projecting one instant into two zones and converting each local
        // rendering back yields the original instant.
        let instant = local_input_to_utc("2024-05-20", "09:15", London).unwrap();
        for zone in [New_York, Tokyo, London] {
            let local = utc_to_local_input(instant, zone);
            let back = local_input_to_utc(&local.date, &local.time, zone).unwrap();
            assert_eq!(back, instant, "re-zoning through {}", zone);
        }
    }

    #[test]
    fn test_dst_gap_is_rejected() {
        // 2024-03-10 02:30 does not exist in New York; clocks jump 02:00 -> 03:00
        let err = local_input_to_utc("2024-03-10", "02:30", New_York).unwrap_err();
        assert!(matches!(err, DateTimeError::NonexistentLocalTime(_, _)));
    }

    #[test]
    fn test_dst_overlap_is_rejected() {
        // 2024-11-03 01:30 happens twice in New York; clocks fall back 02:00 -> 01:00
        let err = local_input_to_utc("2024-11-03", "01:30", New_York).unwrap_err();
        assert!(matches!(err, DateTimeError::AmbiguousLocalTime(_, _)));
    }

    #[test]
    fn test_nonexistent_calendar_dates() {
        assert!(matches!(
            local_input_to_utc("2024-02-30", "10:00", chrono_tz::UTC),
            Err(DateTimeError::InvalidDate(_))
        ));
        assert!(matches!(
            local_input_to_utc("2024-13-01", "10:00", chrono_tz::UTC),
            Err(DateTimeError::InvalidDate(_))
        ));
        assert!(matches!(
            local_input_to_utc("2024-01-32", "10:00", chrono_tz::UTC),
            Err(DateTimeError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_invalid_time_of_day() {
        assert!(matches!(
            local_input_to_utc("2024-01-15", "25:00", chrono_tz::UTC),
            Err(DateTimeError::InvalidTime(_))
        ));
        assert!(matches!(
            local_input_to_utc("2024-01-15", "not-a-time", chrono_tz::UTC),
            Err(DateTimeError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_parse_time_zone() {
        assert!(parse_time_zone("America/New_York").is_ok());
        assert!(is_valid_time_zone("Asia/Tokyo"));
        assert!(!is_valid_time_zone("Mars/Olympus_Mons"));
        assert!(matches!(
            parse_time_zone("Not/AZone"),
            Err(DateTimeError::UnknownTimeZone(_))
        ));
    }

    #[test]
    fn test_format_for_display() {
        let instant = local_input_to_utc("2024-01-15", "14:30", New_York).unwrap();
        let display = format_for_display(instant, New_York);
        assert_eq!(display.date, "01/15/2024");
        assert_eq!(display.time, "02:30 PM EST");
    }

    #[test]
    fn test_local_day_range_covers_ny_day() {
        let (start, end) = local_day_range("2024-01-15", New_York).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-01-15T05:00:00+00:00");

        // The event entered as 14:30 that day in NY falls inside the range
        let event = local_input_to_utc("2024-01-15", "14:30", New_York).unwrap();
        assert!(start <= event && event <= end);

        // The same wall clock the next day does not
        let next_day = local_input_to_utc("2024-01-16", "14:30", New_York).unwrap();
        assert!(next_day > end);
    }

    #[test]
    fn test_local_day_range_spring_forward() {
        // The day the clocks jump is 23 hours long; bounds must still nest
        let (start, end) = local_day_range("2024-03-10", New_York).unwrap();
        assert!(start < end);
        assert_eq!(
            (end - start).num_seconds() + 1,
            23 * 3600,
            "spring-forward day is 23h"
        );
    }

    #[test]
    fn test_local_month_range() {
        let (start, end) = local_month_range(2024, 1, New_York).unwrap();
        let inside = local_input_to_utc("2024-01-31", "23:00", New_York).unwrap();
        let outside = local_input_to_utc("2024-02-01", "00:30", New_York).unwrap();
        assert!(start <= inside && inside <= end);
        assert!(outside > end);

        assert!(local_month_range(2024, 13, New_York).is_err());
    }

    #[test]
    fn test_resolve_local_time_zone_from_env() {
        std::env::set_var("TZ", "Asia/Tokyo");
        assert_eq!(resolve_local_time_zone(), Tokyo);
        std::env::set_var("TZ", "definitely-not-a-zone");
        assert_eq!(resolve_local_time_zone(), chrono_tz::UTC);
        std::env::remove_var("TZ");
    }
}
