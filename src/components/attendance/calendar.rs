use super::models::{AttendanceKind, AttendanceRecord, PayPeriod};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Hours a worker put in at one company during a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyHoursSummary {
    pub company_id: String,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub days_worked: usize,
}

impl CompanyHoursSummary {
    fn empty(company_id: &str) -> Self {
        Self {
            company_id: company_id.to_string(),
            regular_hours: 0.0,
            overtime_hours: 0.0,
            days_worked: 0,
        }
    }

    /// Regular and overtime hours together
    pub fn total_hours(&self) -> f64 {
        self.regular_hours + self.overtime_hours
    }
}

/// All attendance records of one worker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceCalendar {
    pub worker_id: String,
    pub records: Vec<AttendanceRecord>,
}

impl AttendanceCalendar {
    /// Create an empty calendar for a worker
    pub fn new(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            records: Vec::new(),
        }
    }

    /// Build a calendar from fetched records
    pub fn from_records(worker_id: impl Into<String>, records: Vec<AttendanceRecord>) -> Self {
        let mut calendar = Self::new(worker_id);
        for record in records {
            calendar.add_record(record);
        }
        calendar
    }

    /// Add a record, keeping the calendar sorted by date
    pub fn add_record(&mut self, record: AttendanceRecord) {
        let position = self.records.partition_point(|r| r.date <= record.date);
        self.records.insert(position, record);
    }

    /// Records that fall inside the period
    pub fn records_in<'a>(
        &'a self,
        period: &'a PayPeriod,
    ) -> impl Iterator<Item = &'a AttendanceRecord> + 'a {
        self.records.iter().filter(move |r| period.contains(r.date))
    }

    /// Hours summary for one company
    pub fn summary_for(&self, company_id: &str, period: &PayPeriod) -> CompanyHoursSummary {
        let mut summary = CompanyHoursSummary::empty(company_id);
        let mut days: BTreeSet<NaiveDate> = BTreeSet::new();

        for record in self.records_in(period).filter(|r| r.company_id == company_id) {
            let hours = record.worked_hours();
            match record.kind {
                AttendanceKind::Overtime => summary.overtime_hours += hours,
                _ => summary.regular_hours += hours,
            }
            if hours > 0.0 {
                days.insert(record.date);
            }
        }

        summary.days_worked = days.len();
        summary
    }

    /// Hours summaries for every company seen in the period, in first-seen order
    pub fn summaries(&self, period: &PayPeriod) -> Vec<CompanyHoursSummary> {
        let mut company_ids: Vec<&str> = Vec::new();
        for record in self.records_in(period) {
            if !company_ids.contains(&record.company_id.as_str()) {
                company_ids.push(&record.company_id);
            }
        }

        company_ids
            .into_iter()
            .map(|id| self.summary_for(id, period))
            .collect()
    }

    /// Hours worked at all companies during the period
    pub fn total_hours(&self, period: &PayPeriod) -> f64 {
        self.records_in(period).map(|r| r.worked_hours()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn march() -> PayPeriod {
        PayPeriod::new(date(1), date(31)).unwrap()
    }

    fn sample_calendar() -> AttendanceCalendar {
        AttendanceCalendar::from_records(
            "w-1",
            vec![
                AttendanceRecord::work(date(5), "beta", "12:00", "16:00"),
                AttendanceRecord::work(date(1), "acme", "08:00", "16:00"),
                AttendanceRecord::work(date(2), "acme", "08:00", "12:00"),
                AttendanceRecord::with_hours(date(2), "acme", AttendanceKind::Overtime, 2.0),
                AttendanceRecord::with_hours(date(3), "acme", AttendanceKind::SickLeave, 8.0),
            ],
        )
    }

    #[test]
    fn test_records_are_sorted() {
        let calendar = sample_calendar();
        let dates: Vec<u32> = calendar
            .records
            .iter()
            .map(|r| chrono::Datelike::day(&r.date))
            .collect();
        assert_eq!(dates, vec![1, 2, 2, 3, 5]);
    }

    #[test]
    fn test_summary_for_company() {
        let calendar = sample_calendar();
        let summary = calendar.summary_for("acme", &march());
        assert_eq!(summary.regular_hours, 12.0);
        assert_eq!(summary.overtime_hours, 2.0);
        assert_eq!(summary.days_worked, 2);
        assert_eq!(summary.total_hours(), 14.0);

        let unknown = calendar.summary_for("gamma", &march());
        assert_eq!(unknown.total_hours(), 0.0);
        assert_eq!(unknown.days_worked, 0);
    }

    #[test]
    fn test_summaries_follow_first_seen_order() {
        let calendar = sample_calendar();
        let summaries = calendar.summaries(&march());
        let ids: Vec<&str> = summaries.iter().map(|s| s.company_id.as_str()).collect();
        assert_eq!(ids, vec!["acme", "beta"]);
        assert_eq!(calendar.total_hours(&march()), 18.0);
    }

    #[test]
    fn test_period_filter() {
        let calendar = sample_calendar();
        let first_days = PayPeriod::new(date(1), date(2)).unwrap();
        assert_eq!(calendar.total_hours(&first_days), 14.0);
        assert_eq!(calendar.summaries(&first_days).len(), 1);
    }
}
