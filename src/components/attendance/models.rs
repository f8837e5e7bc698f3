use crate::error::{validation_error, AppResult};
use crate::utils::time::hours_between;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of an attendance record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceKind {
    #[default]
    Work,
    Overtime,
    Holiday,
    Vacation,
    SickLeave,
    Absence,
    DayOff,
}

impl AttendanceKind {
    /// Whether records of this kind add to hours worked
    pub fn counts_as_worked(&self) -> bool {
        matches!(self, AttendanceKind::Work | AttendanceKind::Overtime)
    }
}

/// Inclusive date range a salary is calculated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PayPeriod {
    /// Create a period, rejecting an end date before the start date
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if end < start {
            return Err(validation_error(&format!(
                "Period end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Check if a date falls inside the period
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Format the period as "start - end"
    pub fn format(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// A single day of attendance at one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub company_id: String,
    #[serde(default)]
    pub kind: AttendanceKind,
    /// Start time (HH:MM)
    #[serde(default)]
    pub start_time: Option<String>,
    /// End time (HH:MM)
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub break_minutes: u32,
    /// Explicit hour count, overrides the times when present
    #[serde(default)]
    pub hours: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AttendanceRecord {
    /// Create a work record with start and end times
    pub fn work(
        date: NaiveDate,
        company_id: impl Into<String>,
        start_time: &str,
        end_time: &str,
    ) -> Self {
        Self {
            date,
            company_id: company_id.into(),
            kind: AttendanceKind::Work,
            start_time: Some(start_time.to_string()),
            end_time: Some(end_time.to_string()),
            break_minutes: 0,
            hours: None,
            notes: None,
        }
    }

    /// Create a record with an explicit number of hours
    pub fn with_hours(
        date: NaiveDate,
        company_id: impl Into<String>,
        kind: AttendanceKind,
        hours: f64,
    ) -> Self {
        Self {
            date,
            company_id: company_id.into(),
            kind,
            start_time: None,
            end_time: None,
            break_minutes: 0,
            hours: Some(hours),
            notes: None,
        }
    }

    /// Set an unpaid break
    pub fn with_break(mut self, minutes: u32) -> Self {
        self.break_minutes = minutes;
        self
    }

    /// Hours this record contributes to the worked total
    pub fn worked_hours(&self) -> f64 {
        if !self.kind.counts_as_worked() {
            return 0.0;
        }

        if let Some(hours) = self.hours {
            return if hours.is_finite() { hours.max(0.0) } else { 0.0 };
        }

        let span = match (self.start_time.as_deref(), self.end_time.as_deref()) {
            (Some(start), Some(end)) => hours_between(start, end).unwrap_or(0.0),
            _ => 0.0,
        };

        (span - self.break_minutes as f64 / 60.0).max(0.0)
    }

    /// Format the record as a human-readable string
    pub fn format(&self) -> String {
        match (self.start_time.as_ref(), self.end_time.as_ref()) {
            (Some(start), Some(end)) => format!("{} - {} ({:.2} h)", start, end, self.worked_hours()),
            _ => format!("{:.2} h", self.worked_hours()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_worked_hours_from_times() {
        let record = AttendanceRecord::work(date(1), "acme", "08:00", "16:30").with_break(30);
        assert_eq!(record.worked_hours(), 8.0);

        let night = AttendanceRecord::work(date(2), "acme", "22:00", "06:00");
        assert_eq!(night.worked_hours(), 8.0);
    }

    #[test]
    fn test_explicit_hours_win() {
        let mut record = AttendanceRecord::work(date(1), "acme", "08:00", "16:00");
        record.hours = Some(5.5);
        assert_eq!(record.worked_hours(), 5.5);
    }

    #[test]
    fn test_non_worked_kinds() {
        let vacation = AttendanceRecord::with_hours(date(4), "acme", AttendanceKind::Vacation, 8.0);
        assert_eq!(vacation.worked_hours(), 0.0);

        let mut incomplete = AttendanceRecord::work(date(5), "acme", "08:00", "16:00");
        incomplete.end_time = None;
        assert_eq!(incomplete.worked_hours(), 0.0);

        // Break longer than the shift never goes negative
        let short = AttendanceRecord::work(date(6), "acme", "08:00", "08:30").with_break(60);
        assert_eq!(short.worked_hours(), 0.0);
    }

    #[test]
    fn test_period() {
        assert!(PayPeriod::new(date(10), date(1)).is_err());
        let period = PayPeriod::new(date(1), date(15)).unwrap();
        assert!(period.contains(date(1)));
        assert!(period.contains(date(15)));
        assert!(!period.contains(date(16)));
        assert_eq!(period.format(), "2024-03-01 - 2024-03-15");
    }

    #[test]
    fn test_record_deserializes_with_defaults() {
        let record: AttendanceRecord = serde_json::from_str(
            r#"{"date":"2024-03-01","company_id":"acme","start_time":"09:00","end_time":"17:00"}"#,
        )
        .unwrap();
        assert_eq!(record.kind, AttendanceKind::Work);
        assert_eq!(record.worked_hours(), 8.0);
    }
}
