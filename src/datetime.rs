//! Windows FILETIME conversion plus timezone and date filter helpers.

use crate::error::{Error, Result};
use crate::types::Timestamp;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// Microseconds between 1601-01-01 and 1970-01-01
pub const FILETIME_UNIX_EPOCH_MICROS: i64 = 11_644_473_600_000_000;

/// Convert a FILETIME (100ns intervals since 1601-01-01 UTC) to a microsecond timestamp.
///
/// Zero, anything at or before the Unix epoch, and anything chrono cannot
/// represent come back as `Timestamp::Unset`.
pub fn filetime_to_timestamp(filetime: u64) -> Timestamp {
    if filetime == 0 {
        return Timestamp::Unset;
    }

    // u64::MAX / 10 still fits in an i64
    let unix_micros = (filetime / 10) as i64 - FILETIME_UNIX_EPOCH_MICROS;
    if unix_micros <= 0 {
        return Timestamp::Unset;
    }

    DateTime::from_timestamp_micros(unix_micros)
        .map(Timestamp::At)
        .unwrap_or(Timestamp::Unset)
}

/// Parse timezone string into a Tz object.
/// Accepts "UTC", UTC offset notation like "UTC+8" or "UTC-5", and IANA names
pub fn parse_timezone(timezone_str: &str) -> Result<Tz> {
    if timezone_str == "UTC" {
        return Ok(Tz::UTC);
    }

    if let Some(offset_part) = timezone_str.strip_prefix("UTC") {
        let offset_hours: i32 = offset_part.parse().map_err(|_| {
            Error::InvalidInput(format!(
                "Invalid UTC offset '{}'. Use format like 'UTC+8' or 'UTC-5'",
                timezone_str
            ))
        })?;
        if !(-12..=14).contains(&offset_hours) {
            return Err(Error::InvalidInput(format!(
                "UTC offset out of range in '{}'",
                timezone_str
            )));
        }
        if offset_hours == 0 {
            return Ok(Tz::UTC);
        }

        // Etc/GMT zones use inverted signs: Etc/GMT-8 is UTC+8
        let etc_name = format!("Etc/GMT{:+}", -offset_hours);
        return etc_name.parse::<Tz>().map_err(|_| {
            Error::InvalidInput(format!("Unsupported UTC offset '{}'", timezone_str))
        });
    }

    timezone_str.parse::<Tz>().map_err(|_| {
        Error::InvalidInput(format!(
            "Invalid timezone '{}'. Use 'UTC', 'UTC+8' or an IANA name",
            timezone_str
        ))
    })
}

/// Convert UTC datetime to specified timezone
pub fn convert_to_timezone(utc_dt: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    utc_dt.with_timezone(&tz)
}

/// Parse date string in various formats (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
pub fn parse_date_filter(date_str: &str) -> Result<DateTime<Utc>> {
    if let Ok(naive_dt) = NaiveDateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive_dt));
    }

    if let Ok(naive_date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        let naive_dt = naive_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| Error::InvalidInput("Invalid date format".to_string()))?;
        return Ok(Utc.from_utc_datetime(&naive_dt));
    }

    Err(Error::InvalidInput(format!(
        "Invalid date format '{}'. Use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS",
        date_str
    )))
}

/// Format a timestamp for human-readable output in the given timezone,
/// e.g. "Mon 2012-03-12 20:49:58.633000 UTC   "
pub fn format_timestamp_human(timestamp: &Timestamp, tz: Tz) -> String {
    match timestamp.as_datetime() {
        Some(utc_dt) => {
            let dt = convert_to_timezone(utc_dt, tz);
            format!(
                "{} {} {}",
                format_weekday(dt.weekday()),
                dt.format("%Y-%m-%d %H:%M:%S%.6f"),
                format_utc_offset(&dt)
            )
        }
        None => "Not set".to_string(),
    }
}

/// Format weekday as three-letter abbreviation
fn format_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Format UTC offset padded to six columns (e.g. "UTC+8 ", "UTC-10", "UTC   ")
fn format_utc_offset<T: TimeZone>(dt: &DateTime<T>) -> String {
    let offset_seconds = dt.offset().fix().local_minus_utc();
    let offset_hours = offset_seconds / 3600;
    let offset_minutes = (offset_seconds.abs() % 3600) / 60;

    if offset_minutes != 0 {
        return format!("UTC{:+}:{:02}", offset_hours, offset_minutes);
    }

    match offset_hours {
        0 => "UTC   ".to_string(),
        h if (-9..=9).contains(&h) => format!("UTC{:+} ", h),
        h => format!("UTC{:+}", h),
    }
}

/// Check if a timestamp falls within the specified date range.
/// Unset timestamps only pass when no bound is set
pub fn timestamp_in_range(
    timestamp: &Timestamp,
    after: &Option<DateTime<Utc>>,
    before: &Option<DateTime<Utc>>,
) -> bool {
    let Some(ts) = timestamp.as_datetime() else {
        return after.is_none() && before.is_none();
    };

    if let Some(after_dt) = after {
        if ts < *after_dt {
            return false;
        }
    }

    if let Some(before_dt) = before {
        if ts > *before_dt {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use proptest::prelude::*;

    fn at(date: &str) -> DateTime<Utc> {
        let naive = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S%.f").unwrap();
        Utc.from_utc_datetime(&naive)
    }

    #[test]
    fn test_filetime_zero_is_unset() {
        assert_eq!(filetime_to_timestamp(0), Timestamp::Unset);
    }

    #[test]
    fn test_filetime_before_unix_epoch_is_unset() {
        // 1601-01-01 plus one second
        assert_eq!(filetime_to_timestamp(10_000_000), Timestamp::Unset);
        // exactly 1970-01-01
        assert_eq!(filetime_to_timestamp(116_444_736_000_000_000), Timestamp::Unset);
    }

    #[test]
    fn test_filetime_known_values() {
        assert_eq!(
            filetime_to_timestamp(129_760_589_986_330_000),
            Timestamp::At(at("2012-03-12 20:49:58.633"))
        );
        assert_eq!(
            filetime_to_timestamp(131_117_098_656_180_000),
            Timestamp::At(at("2016-06-29 21:37:45.618"))
        );
        assert_eq!(
            filetime_to_timestamp(127_379_243_052_370_000),
            Timestamp::At(at("2004-08-25 16:18:25.237"))
        );
    }

    #[test]
    fn test_filetime_sub_microsecond_digits_dropped() {
        let ts = filetime_to_timestamp(129_760_589_986_330_009);
        let dt = ts.as_datetime().unwrap();
        assert_eq!(dt.nanosecond(), 633_000_000);
    }

    #[test]
    fn test_filetime_max_does_not_panic() {
        let ts = filetime_to_timestamp(u64::MAX);
        assert!(ts.is_set());
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("UTC").unwrap(), Tz::UTC);
        assert_eq!(parse_timezone("UTC+0").unwrap(), Tz::UTC);
        assert!(parse_timezone("UTC+8").is_ok());
        assert!(parse_timezone("UTC-5").is_ok());
        assert!(parse_timezone("Asia/Hong_Kong").is_ok());
        assert!(parse_timezone("UTC+25").is_err());
        assert!(parse_timezone("Invalid/Timezone").is_err());
    }

    #[test]
    fn test_utc_offset_is_fixed() {
        let tz = parse_timezone("UTC+8").unwrap();
        let dt = convert_to_timezone(at("2024-07-01 12:00:00.0"), tz);
        assert_eq!(dt.hour(), 20);
    }

    #[test]
    fn test_parse_date_filter() {
        let dt = parse_date_filter("2023-12-25").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-12-25 00:00:00");

        let dt = parse_date_filter("2023-12-25 15:30:45").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-12-25 15:30:45");

        assert!(parse_date_filter("invalid-date").is_err());
        assert!(parse_date_filter("2023/12/25").is_err());
    }

    #[test]
    fn test_format_timestamp_human() {
        let ts = Timestamp::At(at("2012-03-12 20:49:58.633"));
        assert_eq!(
            format_timestamp_human(&ts, Tz::UTC),
            "Mon 2012-03-12 20:49:58.633000 UTC   "
        );

        let hk = parse_timezone("UTC+8").unwrap();
        assert!(format_timestamp_human(&ts, hk).ends_with("UTC+8 "));

        let honolulu = parse_timezone("UTC-10").unwrap();
        assert!(format_timestamp_human(&ts, honolulu).ends_with("UTC-10"));

        assert_eq!(format_timestamp_human(&Timestamp::Unset, Tz::UTC), "Not set");
    }

    #[test]
    fn test_timestamp_in_range() {
        let ts = Timestamp::At(
            NaiveDate::from_ymd_opt(2023, 12, 25).unwrap().and_hms_opt(12, 0, 0).unwrap().and_utc(),
        );
        let after = Some(at("2023-12-20 00:00:00.0"));
        let before = Some(at("2023-12-30 00:00:00.0"));
        assert!(timestamp_in_range(&ts, &after, &before));

        let late_after = Some(at("2023-12-26 00:00:00.0"));
        assert!(!timestamp_in_range(&ts, &late_after, &before));

        assert!(timestamp_in_range(&Timestamp::Unset, &None, &None));
        assert!(!timestamp_in_range(&Timestamp::Unset, &after, &None));
    }

    // Smallest FILETIME that lands after the Unix epoch
    const FIRST_VALID: u64 = 116_444_736_000_000_010;

    proptest! {
        #[test]
        fn conversion_is_strictly_monotonic(b in FIRST_VALID..u64::MAX / 2, delta in 10u64..u64::MAX / 2) {
            let a = b + delta;
            prop_assume!(a / 10 > b / 10);
            prop_assert!(filetime_to_timestamp(a) > filetime_to_timestamp(b));
        }

        #[test]
        fn valid_values_are_set(value in FIRST_VALID..u64::MAX) {
            prop_assert!(filetime_to_timestamp(value).is_set());
        }
    }
}
