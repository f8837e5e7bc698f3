use chrono::NaiveDate;
use palkkalaskuri::components::attendance::{
    AttendanceCalendar, AttendanceKind, AttendanceRecord, HoursSheet, PayPeriod,
};
use palkkalaskuri::components::directory::Worker;
use palkkalaskuri::components::report::{export_pdf, ReportContext, ReportOptions, ReportTemplate};
use palkkalaskuri::components::salary::{
    calculate, split_payment, Adjustment, CompanyLine, DistributionBasis, OtherPayment,
    OtherPaymentKind, PaymentMethod, SalaryInput, TierRule,
};
use palkkalaskuri::config::Config;
use palkkalaskuri::utils::money::CENT_TOLERANCE;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn march() -> PayPeriod {
    PayPeriod::new(date(1), date(31)).unwrap()
}

/// Smoke test to verify that the default config is usable
#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.currency, "EUR");
    assert!(config.api_base_url.is_none());
}

/// Hours from the calendar flow through to the allocation
#[test]
fn test_calendar_to_breakdown() {
    let calendar = AttendanceCalendar::from_records(
        "w-1",
        vec![
            AttendanceRecord::work(date(4), "acme", "08:00", "16:30").with_break(30),
            AttendanceRecord::work(date(5), "beta", "22:00", "06:00"),
            AttendanceRecord::with_hours(date(6), "acme", AttendanceKind::Overtime, 2.0),
            AttendanceRecord::with_hours(date(7), "acme", AttendanceKind::SickLeave, 8.0),
        ],
    );

    let mut input = SalaryInput::new(
        march(),
        vec![
            CompanyLine::hourly("acme", 20.0, 0.0),
            CompanyLine::hourly("beta", 25.0, 0.0),
        ],
    );
    let ids: Vec<String> = input.companies.iter().map(|c| c.company_id.clone()).collect();
    let sheet = HoursSheet::from_calendar(&ids, &calendar, &march());
    input.apply_hours(&sheet);

    assert_eq!(input.companies[0].hours, 8.0);
    assert_eq!(input.companies[0].overtime_hours, 2.0);
    assert_eq!(input.companies[1].hours, 8.0);

    let breakdown = calculate(&input).unwrap();
    // 8 * 20 + 2 * 20 * 1.5 + 8 * 25
    assert_eq!(breakdown.total, 420.0);
    assert!((breakdown.allocated() - breakdown.total).abs() <= CENT_TOLERANCE);
}

/// Company amounts always add up to the total within a cent
#[test]
fn test_allocation_sums_to_total() {
    let rates = [13.37, 17.01, 9.99];
    let hours = [7.3, 11.1, 3.7];

    for redistribute in [false, true] {
        for basis in [
            DistributionBasis::Hours,
            DistributionBasis::Weight,
            DistributionBasis::Equal,
        ] {
            let companies = ["a", "b", "c"]
                .iter()
                .enumerate()
                .map(|(i, id)| {
                    let mut line = CompanyLine::hourly(*id, rates[i], hours[i]);
                    line.weight = Some((i + 1) as f64);
                    line
                })
                .collect();

            let mut input = SalaryInput::new(march(), companies);
            input.redistribute = redistribute;
            input.basis = basis;
            input.bonuses.push(Adjustment {
                label: "Shift bonus".to_string(),
                amount: 10.01,
            });
            input.deductions.push(Adjustment {
                label: "Meal".to_string(),
                amount: 3.33,
            });
            input.other_payments.push(OtherPayment {
                kind: OtherPaymentKind::Supplement,
                label: "Travel".to_string(),
                amount: 7.77,
                company_id: None,
            });
            input.other_payments.push(OtherPayment {
                kind: OtherPaymentKind::Debt,
                label: "Advance".to_string(),
                amount: 5.55,
                company_id: Some("b".to_string()),
            });

            let breakdown = calculate(&input).unwrap();
            assert!(
                (breakdown.allocated() - breakdown.total).abs() <= CENT_TOLERANCE,
                "redistribute={} basis={:?}",
                redistribute,
                basis
            );
        }
    }
}

/// A remainder rule makes the tiers add up to the total
#[test]
fn test_tiers_with_remainder() {
    let rules = vec![
        TierRule::percentage(PaymentMethod::Cash, 33.0),
        TierRule::remainder(PaymentMethod::BankTransfer),
        TierRule::fixed(PaymentMethod::Other("voucher".to_string()), 50.0),
    ];
    let split = split_payment(1234.56, &rules).unwrap();
    assert!((split.assigned() - 1234.56).abs() <= CENT_TOLERANCE);
    assert_eq!(split.unassigned, 0.0);
    assert!(split.tiers[1].is_remainder);
}

/// Calculation to PDF with the built-in template
#[test]
fn test_report_export() {
    let mut input = SalaryInput::new(march(), vec![CompanyLine::monthly("acme", 2500.0, 160.0)]);
    input.payment_tiers = vec![TierRule::remainder(PaymentMethod::BankTransfer)];
    let breakdown = calculate(&input).unwrap();

    let worker = Worker {
        id: "w-1".to_string(),
        first_name: "Aino".to_string(),
        last_name: "Virtanen".to_string(),
        document_id: None,
        email: None,
        company_ids: vec!["acme".to_string()],
        hourly_rate: None,
        active: true,
    };
    let options = ReportOptions {
        locale: "fi".to_string(),
        currency: "EUR".to_string(),
        generated_at: chrono::Utc::now().with_timezone(&chrono_tz::Europe::Helsinki),
    };

    let context = ReportContext::build(&worker, &input, &breakdown, &options);
    assert_eq!(context.values["total"], "2500,00 EUR");

    let html = ReportTemplate::builtin().render(&context).unwrap();
    assert!(html.contains("Aino Virtanen"));

    let pdf = export_pdf(&ReportTemplate::builtin(), &context).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}
