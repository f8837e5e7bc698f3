use super::calendar::AttendanceCalendar;
use super::models::PayPeriod;
use crate::error::{validation_error, AppResult};
use crate::utils::money::is_valid_quantity;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hours used for one company in a salary calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyHours {
    pub company_id: String,
    /// Take the hours from the attendance calendar
    pub auto_fill: bool,
    pub hours: f64,
    pub overtime_hours: f64,
}

/// Per-company hours, either filled from the calendar or typed in by hand
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoursSheet {
    entries: Vec<CompanyHours>,
}

impl HoursSheet {
    /// Build a sheet with auto-fill enabled for every company
    pub fn from_calendar(
        company_ids: &[String],
        calendar: &AttendanceCalendar,
        period: &PayPeriod,
    ) -> Self {
        let entries = company_ids
            .iter()
            .map(|id| {
                let summary = calendar.summary_for(id, period);
                CompanyHours {
                    company_id: id.clone(),
                    auto_fill: true,
                    hours: summary.regular_hours,
                    overtime_hours: summary.overtime_hours,
                }
            })
            .collect();

        Self { entries }
    }

    /// Hours entry for a company
    pub fn get(&self, company_id: &str) -> Option<&CompanyHours> {
        self.entries.iter().find(|e| e.company_id == company_id)
    }

    fn entry_mut(&mut self, company_id: &str) -> AppResult<&mut CompanyHours> {
        self.entries
            .iter_mut()
            .find(|e| e.company_id == company_id)
            .ok_or_else(|| validation_error(&format!("Unknown company: {}", company_id)))
    }

    /// Type in hours by hand; turns auto-fill off for the company
    pub fn set_manual_hours(
        &mut self,
        company_id: &str,
        hours: f64,
        overtime_hours: f64,
    ) -> AppResult<()> {
        if !is_valid_quantity(hours) || !is_valid_quantity(overtime_hours) {
            return Err(validation_error(&format!(
                "Hours for {} must be non-negative numbers",
                company_id
            )));
        }

        let entry = self.entry_mut(company_id)?;
        entry.auto_fill = false;
        entry.hours = hours;
        entry.overtime_hours = overtime_hours;
        Ok(())
    }

    /// Toggle auto-fill for a company.
    ///
    /// Enabling always recomputes from the calendar, so disabling and
    /// re-enabling gives back the same hours as long as the calendar is
    /// unchanged. Disabling keeps the current hours as the manual value.
    pub fn set_auto_fill(
        &mut self,
        company_id: &str,
        enabled: bool,
        calendar: &AttendanceCalendar,
        period: &PayPeriod,
    ) -> AppResult<()> {
        let entry = self.entry_mut(company_id)?;
        entry.auto_fill = enabled;

        if enabled {
            let summary = calendar.summary_for(company_id, period);
            entry.hours = summary.regular_hours;
            entry.overtime_hours = summary.overtime_hours;
        }

        debug!(
            "Auto-fill for {} set to {} ({} h)",
            company_id, enabled, entry.hours
        );
        Ok(())
    }

    /// Recompute every auto-filled entry after the calendar changed
    pub fn refresh(&mut self, calendar: &AttendanceCalendar, period: &PayPeriod) {
        for entry in self.entries.iter_mut().filter(|e| e.auto_fill) {
            let summary = calendar.summary_for(&entry.company_id, period);
            entry.hours = summary.regular_hours;
            entry.overtime_hours = summary.overtime_hours;
        }
    }

    /// Regular plus overtime hours over all companies
    pub fn total_hours(&self) -> f64 {
        self.entries.iter().map(|e| e.hours + e.overtime_hours).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::attendance::models::{AttendanceKind, AttendanceRecord};
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn setup() -> (AttendanceCalendar, PayPeriod, HoursSheet) {
        let calendar = AttendanceCalendar::from_records(
            "w-1",
            vec![
                AttendanceRecord::work(date(1), "acme", "08:00", "16:00"),
                AttendanceRecord::work(date(2), "acme", "08:00", "14:00"),
                AttendanceRecord::with_hours(date(2), "acme", AttendanceKind::Overtime, 1.5),
                AttendanceRecord::work(date(3), "beta", "10:00", "14:00"),
            ],
        );
        let period = PayPeriod::new(date(1), date(31)).unwrap();
        let companies = vec!["acme".to_string(), "beta".to_string()];
        let sheet = HoursSheet::from_calendar(&companies, &calendar, &period);
        (calendar, period, sheet)
    }

    #[test]
    fn test_from_calendar() {
        let (_, _, sheet) = setup();
        let acme = sheet.get("acme").unwrap();
        assert!(acme.auto_fill);
        assert_eq!(acme.hours, 14.0);
        assert_eq!(acme.overtime_hours, 1.5);
        assert_eq!(sheet.get("beta").unwrap().hours, 4.0);
        assert_eq!(sheet.total_hours(), 19.5);
    }

    #[test]
    fn test_toggle_auto_fill_is_idempotent() {
        let (calendar, period, mut sheet) = setup();
        let before = sheet.get("acme").unwrap().clone();

        sheet.set_auto_fill("acme", false, &calendar, &period).unwrap();
        let disabled = sheet.get("acme").unwrap();
        assert!(!disabled.auto_fill);
        assert_eq!(disabled.hours, before.hours);

        sheet.set_manual_hours("acme", 3.0, 0.0).unwrap();
        sheet.set_auto_fill("acme", true, &calendar, &period).unwrap();
        assert_eq!(sheet.get("acme").unwrap(), &before);

        // Enabling twice gives the same result
        sheet.set_auto_fill("acme", true, &calendar, &period).unwrap();
        assert_eq!(sheet.get("acme").unwrap(), &before);
    }

    #[test]
    fn test_refresh_skips_manual_entries() {
        let (mut calendar, period, mut sheet) = setup();
        sheet.set_manual_hours("beta", 10.0, 0.0).unwrap();

        calendar.add_record(AttendanceRecord::work(date(4), "acme", "08:00", "10:00"));
        calendar.add_record(AttendanceRecord::work(date(4), "beta", "12:00", "14:00"));
        sheet.refresh(&calendar, &period);

        assert_eq!(sheet.get("acme").unwrap().hours, 16.0);
        assert_eq!(sheet.get("beta").unwrap().hours, 10.0);
    }

    #[test]
    fn test_invalid_manual_hours() {
        let (_, _, mut sheet) = setup();
        assert!(sheet.set_manual_hours("acme", -1.0, 0.0).is_err());
        assert!(sheet.set_manual_hours("acme", f64::NAN, 0.0).is_err());
        assert!(sheet.set_manual_hours("gamma", 1.0, 0.0).is_err());
    }
}
