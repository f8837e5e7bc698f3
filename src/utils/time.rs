use crate::error::{validation_error, AppResult};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Parse a month in YYYY-MM format into its first and last day
pub fn parse_month(month_str: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let invalid = || validation_error(&format!("Invalid month '{}', expected YYYY-MM", month_str));
    let (year, month) = month_str.trim().split_once('-').ok_or_else(invalid)?;
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let month = month.parse::<u32>().map_err(|_| invalid())?;
    month_range(year, month)
}

/// Hours between two HH:MM times.
///
/// An end time at or before the start time is taken to be on the next day,
/// so "22:00" - "06:00" is an eight hour night shift.
pub fn hours_between(start: &str, end: &str) -> Option<f64> {
    let (start_hour, start_minute) = parse_time(start)?;
    let (end_hour, end_minute) = parse_time(end)?;

    let start_minutes = (start_hour * 60 + start_minute) as i64;
    let mut end_minutes = (end_hour * 60 + end_minute) as i64;

    if end_minutes <= start_minutes {
        end_minutes += 24 * 60;
    }

    Some((end_minutes - start_minutes) as f64 / 60.0)
}

/// First and last day of a calendar month
pub fn month_range(year: i32, month: u32) -> AppResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| validation_error(&format!("Invalid month {}-{}", year, month)))?;

    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| validation_error(&format!("Invalid month {}-{}", year, month)))?;

    let last = next_first
        .pred_opt()
        .ok_or_else(|| validation_error("Month has no last day"))?;

    Ok((first, last))
}

/// Current time in the given timezone
pub fn now_in(tz: Tz) -> DateTime<Tz> {
    tz.from_utc_datetime(&Utc::now().naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        // Valid cases
        assert_eq!(parse_time("00:00"), Some((0, 0)));
        assert_eq!(parse_time("12:30"), Some((12, 30)));
        assert_eq!(parse_time("23:59"), Some((23, 59)));
        assert_eq!(parse_time(" 7:05 "), Some((7, 5)));

        // Invalid cases
        assert_eq!(parse_time("24:00"), None); // Hour out of range
        assert_eq!(parse_time("12:60"), None); // Minute out of range
        assert_eq!(parse_time("12:30:45"), None); // Too many parts
        assert_eq!(parse_time("12"), None); // Too few parts
        assert_eq!(parse_time("12:ab"), None); // Invalid minute
    }

    #[test]
    fn test_parse_month() {
        let (first, last) = parse_month("2024-02").unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("02/2024").is_err());
        assert!(parse_month("2024").is_err());
    }

    #[test]
    fn test_hours_between() {
        assert_eq!(hours_between("08:00", "16:30"), Some(8.5));
        // Night shift crosses midnight
        assert_eq!(hours_between("22:00", "06:00"), Some(8.0));
        // Same start and end is a full day
        assert_eq!(hours_between("07:00", "07:00"), Some(24.0));
        assert_eq!(hours_between("7", "16:00"), None);
    }

    #[test]
    fn test_month_range() {
        let (first, last) = month_range(2024, 2).unwrap();
        assert_eq!(first.to_string(), "2024-02-01");
        assert_eq!(last.to_string(), "2024-02-29");

        let (first, last) = month_range(2023, 12).unwrap();
        assert_eq!(first.to_string(), "2023-12-01");
        assert_eq!(last.to_string(), "2023-12-31");

        assert!(month_range(2023, 13).is_err());
    }
}
