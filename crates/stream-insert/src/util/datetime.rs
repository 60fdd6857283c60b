//! Civil date/time formatting for the JSON wire format.
//!
//! Converts between the crate's internal representations and the string
//! forms the insert endpoint accepts:
//! - Date: days since Unix epoch (1970-01-01) -> `YYYY-MM-DD`
//! - Time: microseconds since midnight -> `HH:MM:SS[.ffffff]`
//! - Datetime: civil microseconds since epoch -> `YYYY-MM-DD HH:MM:SS[.ffffff]`
//! - Timestamp: UTC microseconds since epoch -> `YYYY-MM-DDTHH:MM:SS[.ffffff]Z`

const MICROSECONDS_PER_SECOND: i64 = 1_000_000;
const MICROSECONDS_PER_MINUTE: i64 = 60 * MICROSECONDS_PER_SECOND;
const MICROSECONDS_PER_HOUR: i64 = 60 * MICROSECONDS_PER_MINUTE;
const MICROSECONDS_PER_DAY: i64 = 24 * MICROSECONDS_PER_HOUR;

/// Largest valid time-of-day in microseconds (23:59:59.999999).
pub const MAX_TIME_MICROS: i64 = MICROSECONDS_PER_DAY - 1;

/// Days since epoch of 0001-01-01, the earliest supported date.
pub const MIN_DATE_DAYS: i32 = -719_162;

/// Days since epoch of 9999-12-31, the latest supported date.
pub const MAX_DATE_DAYS: i32 = 2_932_896;

/// Microseconds since epoch of 0001-01-01T00:00:00.
pub const MIN_EPOCH_MICROS: i64 = MIN_DATE_DAYS as i64 * MICROSECONDS_PER_DAY;

/// Microseconds since epoch of 9999-12-31T23:59:59.999999.
pub const MAX_EPOCH_MICROS: i64 = (MAX_DATE_DAYS as i64 + 1) * MICROSECONDS_PER_DAY - 1;

/// Formats microseconds as fractional seconds string, omitting if zero.
fn format_fractional_seconds(us: i64) -> String {
    if us == 0 {
        return String::new();
    }

    // Convert to 6-digit string and trim trailing zeros
    let str = format!("{:06}", us);
    let trimmed = str.trim_end_matches('0');
    format!(".{}", trimmed)
}

/// Returns true if the given year is a leap year.
fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed).
fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Calculates days since Unix epoch for a date, or `None` if the date is invalid.
///
/// Based on Howard Hinnant's `days_from_civil`.
pub fn date_to_days(year: i32, month: u32, day: u32) -> Option<i32> {
    if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
        return None;
    }

    let y = if month <= 2 { year - 1 } else { year } as i64;
    let m = if month <= 2 {
        month as i64 + 9
    } else {
        month as i64 - 3
    };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u32; // year of era
    let doy = (153 * m as u32 + 2) / 5 + day - 1; // day of year
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // day of era

    i32::try_from(era * 146097 + doe as i64 - 719468).ok()
}

/// Converts days since Unix epoch to (year, month, day).
fn days_to_date(days: i32) -> (i32, u32, u32) {
    let z = days as i64 + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32; // day of era
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // year of era
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // day of year
    let mp = (5 * doy + 2) / 153; // month index
    let d = doy - (153 * mp + 2) / 5 + 1; // day
    let m = if mp < 10 { mp + 3 } else { mp - 9 }; // month

    let year = if m <= 2 { y + 1 } else { y } as i32;
    (year, m, d)
}

/// Splits epoch microseconds into whole days and microseconds within the day.
fn split_epoch_micros(epoch_us: i64) -> (i32, i64) {
    let days = epoch_us.div_euclid(MICROSECONDS_PER_DAY);
    let time_us = epoch_us.rem_euclid(MICROSECONDS_PER_DAY);
    (days as i32, time_us)
}

/// Formats days since Unix epoch as `YYYY-MM-DD`.
pub fn format_date(days: i32) -> String {
    let (year, month, day) = days_to_date(days);
    format!("{:04}-{:02}-{:02}", year, month, day)
}

/// Formats microseconds since midnight as `HH:MM:SS[.ffffff]`.
///
/// Values outside a single day wrap around midnight.
pub fn format_time(time_us: i64) -> String {
    let time_us = time_us.rem_euclid(MICROSECONDS_PER_DAY);
    let hours = time_us / MICROSECONDS_PER_HOUR;
    let minutes = (time_us % MICROSECONDS_PER_HOUR) / MICROSECONDS_PER_MINUTE;
    let seconds = (time_us % MICROSECONDS_PER_MINUTE) / MICROSECONDS_PER_SECOND;
    let micros = time_us % MICROSECONDS_PER_SECOND;

    format!(
        "{:02}:{:02}:{:02}{}",
        hours,
        minutes,
        seconds,
        format_fractional_seconds(micros)
    )
}

/// Formats civil microseconds since epoch as `YYYY-MM-DD HH:MM:SS[.ffffff]`.
pub fn format_datetime(epoch_us: i64) -> String {
    let (days, time_us) = split_epoch_micros(epoch_us);
    format!("{} {}", format_date(days), format_time(time_us))
}

/// Formats UTC microseconds since epoch as `YYYY-MM-DDTHH:MM:SS[.ffffff]Z`.
pub fn format_timestamp(epoch_us: i64) -> String {
    let (days, time_us) = split_epoch_micros(epoch_us);
    format!("{}T{}Z", format_date(days), format_time(time_us))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_roundtrip() {
        let days = date_to_days(2024, 2, 29).unwrap();
        assert_eq!(format_date(days), "2024-02-29");

        assert_eq!(date_to_days(1970, 1, 1), Some(0));
        assert_eq!(format_date(-1), "1969-12-31");
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(date_to_days(2023, 2, 29), None);
        assert_eq!(date_to_days(2024, 13, 1), None);
        assert_eq!(date_to_days(2024, 4, 31), None);
        assert_eq!(date_to_days(2024, 1, 0), None);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00:00");
        assert_eq!(format_time(14 * MICROSECONDS_PER_HOUR + 30 * MICROSECONDS_PER_MINUTE), "14:30:00");
        assert_eq!(format_time(MAX_TIME_MICROS), "23:59:59.999999");
        assert_eq!(format_time(MICROSECONDS_PER_SECOND + 500_000), "00:00:01.5");
    }

    #[test]
    fn test_format_datetime_and_timestamp() {
        let epoch_us = 1_700_000_000 * MICROSECONDS_PER_SECOND + 250_000;
        assert_eq!(format_datetime(epoch_us), "2023-11-14 22:13:20.25");
        assert_eq!(format_timestamp(epoch_us), "2023-11-14T22:13:20.25Z");
    }

    #[test]
    fn test_format_before_epoch() {
        assert_eq!(format_timestamp(-1), "1969-12-31T23:59:59.999999Z");
    }

    #[test]
    fn test_supported_range_bounds() {
        assert_eq!(date_to_days(1, 1, 1), Some(MIN_DATE_DAYS));
        assert_eq!(date_to_days(9999, 12, 31), Some(MAX_DATE_DAYS));
        assert_eq!(format_date(MIN_DATE_DAYS), "0001-01-01");
        assert_eq!(format_date(MAX_DATE_DAYS), "9999-12-31");
        assert_eq!(format_timestamp(MIN_EPOCH_MICROS), "0001-01-01T00:00:00Z");
        assert_eq!(format_timestamp(MAX_EPOCH_MICROS), "9999-12-31T23:59:59.999999Z");
    }
}
