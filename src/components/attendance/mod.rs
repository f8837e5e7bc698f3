pub mod calendar;
pub mod hours;
pub mod models;

pub use calendar::{AttendanceCalendar, CompanyHoursSummary};
pub use hours::{CompanyHours, HoursSheet};
pub use models::{AttendanceKind, AttendanceRecord, PayPeriod};
