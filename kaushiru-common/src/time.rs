//! Timestamp utilities
//!
//! Timestamps are stored as fixed-width UTC text (`2024-05-01T03:04:05.678Z`)
//! so that lexical order in SQL equals chronological order.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Offset of Japan Standard Time from UTC, in hours.
pub const JST_OFFSET_HOURS: i64 = 9;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp the way it is stored in the database.
pub fn to_db_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 (what this crate writes) and SQLite's
/// `CURRENT_TIMESTAMP` form (`YYYY-MM-DD HH:MM:SS`), which older rows carry.
pub fn parse_db_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Lower bound of a rolling window of `days` days ending at `now`.
pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

/// UTC calendar date (`YYYY-MM-DD`) used as the trend bucket key.
pub fn utc_date(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Start of the current JST day and start of the next one, both in UTC.
pub fn jst_day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let offset = Duration::hours(JST_OFFSET_HOURS);
    let jst_midnight = (now + offset).date_naive().and_time(NaiveTime::MIN);
    let start = Utc.from_utc_datetime(&(jst_midnight - offset));
    (start, start + Duration::days(1))
}

/// Relative Japanese time label for feed display.
///
/// `たった今` under a minute, then minutes, hours, days up to a week,
/// and `M/D` (JST) beyond that.
pub fn relative_label(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - then;
    let minutes = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if minutes < 1 {
        "たった今".to_string()
    } else if minutes < 60 {
        format!("{}分前", minutes)
    } else if hours < 24 {
        format!("{}時間前", hours)
    } else if days < 7 {
        format!("{}日前", days)
    } else {
        let jst = then + Duration::hours(JST_OFFSET_HOURS);
        jst.format("%-m/%-d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_db_timestamp_is_fixed_width() {
        let a = to_db_timestamp(utc("2024-05-01T03:04:05Z"));
        let b = to_db_timestamp(utc("2024-05-01T03:04:05.5Z"));
        assert_eq!(a, "2024-05-01T03:04:05.000Z");
        assert_eq!(b, "2024-05-01T03:04:05.500Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }

    #[test]
    fn test_parse_accepts_both_forms() {
        let written = parse_db_timestamp("2024-05-01T03:04:05.000Z").unwrap();
        let legacy = parse_db_timestamp("2024-05-01 03:04:05").unwrap();
        assert_eq!(written, legacy);
        assert!(parse_db_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_jst_day_bounds_before_utc_midnight() {
        // 2024-05-01 20:00 UTC is 2024-05-02 05:00 JST
        let (start, end) = jst_day_bounds(utc("2024-05-01T20:00:00Z"));
        assert_eq!(start, utc("2024-05-01T15:00:00Z"));
        assert_eq!(end, utc("2024-05-02T15:00:00Z"));
    }

    #[test]
    fn test_jst_day_bounds_morning_utc() {
        // 2024-05-01 03:00 UTC is 2024-05-01 12:00 JST
        let (start, end) = jst_day_bounds(utc("2024-05-01T03:00:00Z"));
        assert_eq!(start, utc("2024-04-30T15:00:00Z"));
        assert_eq!(end, utc("2024-05-01T15:00:00Z"));
    }

    #[test]
    fn test_relative_label() {
        let now = utc("2024-05-10T12:00:00Z");
        assert_eq!(relative_label(utc("2024-05-10T11:59:30Z"), now), "たった今");
        assert_eq!(relative_label(utc("2024-05-10T11:15:00Z"), now), "45分前");
        assert_eq!(relative_label(utc("2024-05-10T07:00:00Z"), now), "5時間前");
        assert_eq!(relative_label(utc("2024-05-08T12:00:00Z"), now), "2日前");
        assert_eq!(relative_label(utc("2024-04-20T16:00:00Z"), now), "4/21");
    }

    #[test]
    fn test_window_start_and_date() {
        let now = utc("2024-05-10T12:00:00Z");
        assert_eq!(window_start(now, 7), utc("2024-05-03T12:00:00Z"));
        assert_eq!(utc_date(now), "2024-05-10");
    }
}
