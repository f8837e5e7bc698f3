use crate::components::directory::models::Worker;
use crate::components::salary::{
    CompanyAllocation, OtherPayment, PaymentMethod, SalaryBreakdown, SalaryInput,
};
use crate::utils::money::format_amount;
use chrono::DateTime;
use chrono_tz::Tz;
use rust_i18n::t;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Label keys copied into every report context
const LABELS: [&str; 18] = [
    "label_title",
    "label_worker",
    "label_document",
    "label_period",
    "label_company",
    "label_hours",
    "label_overtime_hours",
    "label_base_pay",
    "label_overtime_pay",
    "label_bonuses",
    "label_deductions",
    "label_gross",
    "label_other_payments",
    "label_amount",
    "label_total",
    "label_payment_method",
    "label_unassigned",
    "label_generated",
];

/// Locale and formatting settings for a report
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub locale: String,
    pub currency: String,
    pub generated_at: DateTime<Tz>,
}

impl ReportOptions {
    fn decimal_separator(&self) -> char {
        if self.locale.starts_with("fi") {
            ','
        } else {
            '.'
        }
    }

    fn amount(&self, value: f64) -> String {
        format_amount(value, self.decimal_separator(), &self.currency)
    }

    fn number(&self, value: f64) -> String {
        format_amount(value, self.decimal_separator(), "")
    }
}

/// Values and repeated rows a template is rendered with
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub values: BTreeMap<String, String>,
    pub sections: BTreeMap<String, Vec<BTreeMap<String, String>>>,
}

impl ReportContext {
    /// Set a top-level value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Append a row to a section
    pub fn push_row<I, K, V>(&mut self, section: &str, row: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let row = row
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.sections.entry(section.to_string()).or_default().push(row);
    }

    /// Rows of a section, empty when the section has none
    pub fn rows(&self, section: &str) -> &[BTreeMap<String, String>] {
        self.sections
            .get(section)
            .map(|rows| rows.as_slice())
            .unwrap_or(&[])
    }

    /// Build the context for one worker's salary
    pub fn build(
        worker: &Worker,
        input: &SalaryInput,
        breakdown: &SalaryBreakdown,
        options: &ReportOptions,
    ) -> Self {
        let locale = options.locale.as_str();
        let mut context = Self::default();

        for key in LABELS {
            context.insert(key, t!(key, locale = locale).to_string());
        }

        context.insert("document_id", Uuid::new_v4().to_string());
        context.insert(
            "generated_at",
            options.generated_at.format("%Y-%m-%d %H:%M").to_string(),
        );
        context.insert("currency", options.currency.clone());

        context.insert("worker_id", worker.id.clone());
        context.insert("worker_name", worker.full_name());
        context.insert(
            "worker_document",
            worker.document_id.clone().unwrap_or_default(),
        );
        context.insert("worker_email", worker.email.clone().unwrap_or_default());

        context.insert("period", breakdown.period.format());
        context.insert("period_start", breakdown.period.start.format("%Y-%m-%d").to_string());
        context.insert("period_end", breakdown.period.end.format("%Y-%m-%d").to_string());

        context.insert("base_pay", options.amount(breakdown.base_pay));
        context.insert("overtime_pay", options.amount(breakdown.overtime_pay));
        context.insert("bonuses_total", options.amount(breakdown.bonuses));
        context.insert("deductions_total", options.amount(breakdown.deductions));
        context.insert("gross", options.amount(breakdown.gross));
        context.insert(
            "other_payments_net",
            options.amount(breakdown.other_payments_net),
        );
        context.insert("total", options.amount(breakdown.total));

        for company in &breakdown.companies {
            context.push_row(
                "companies",
                [
                    ("company_id", company.company_id.clone()),
                    ("company_name", company_name(company).to_string()),
                    ("hours", options.number(company.hours)),
                    ("overtime_hours", options.number(company.overtime_hours)),
                    ("base_pay", options.amount(company.base_pay)),
                    ("overtime_pay", options.amount(company.overtime_pay)),
                    ("earned", options.amount(company.earned)),
                    ("weight", format!("{} %", options.number(company.weight * 100.0))),
                    ("other_payments", options.amount(company.other_payments)),
                    ("amount", options.amount(company.amount)),
                ],
            );
        }

        for bonus in &input.bonuses {
            context.push_row(
                "bonuses",
                [
                    ("label", bonus.label.clone()),
                    ("amount", options.amount(bonus.amount)),
                ],
            );
        }

        for deduction in &input.deductions {
            context.push_row(
                "deductions",
                [
                    ("label", deduction.label.clone()),
                    ("amount", options.amount(deduction.amount)),
                ],
            );
        }

        for payment in &input.other_payments {
            context.push_row("other_payments", other_payment_row(payment, breakdown, options));
        }

        let unassigned = breakdown.tiers.as_ref().map(|t| t.unassigned).unwrap_or(0.0);
        context.insert("unassigned", options.amount(unassigned));

        if let Some(split) = &breakdown.tiers {
            for tier in &split.tiers {
                context.push_row(
                    "tiers",
                    [
                        ("method", method_name(&tier.method, locale)),
                        ("label", tier.label.clone().unwrap_or_default()),
                        ("amount", options.amount(tier.amount)),
                        (
                            "remainder",
                            if tier.is_remainder {
                                t!("remainder_marker", locale = locale).to_string()
                            } else {
                                String::new()
                            },
                        ),
                    ],
                );
            }
        }

        context
    }
}

/// Company name, or the id when the input has no name
fn company_name(company: &CompanyAllocation) -> &str {
    if company.company_name.is_empty() {
        &company.company_id
    } else {
        &company.company_name
    }
}

fn other_payment_row(
    payment: &OtherPayment,
    breakdown: &SalaryBreakdown,
    options: &ReportOptions,
) -> [(&'static str, String); 4] {
    let company = payment
        .company_id
        .as_ref()
        .map(|id| {
            breakdown
                .companies
                .iter()
                .find(|c| &c.company_id == id)
                .map(|c| company_name(c).to_string())
                .unwrap_or_else(|| id.clone())
        })
        .unwrap_or_default();

    let kind_key = format!("payment_kind_{}", payment.kind.key());
    [
        (
            "kind",
            t!(kind_key.as_str(), locale = options.locale.as_str()).to_string(),
        ),
        ("label", payment.label.clone()),
        ("amount", options.amount(payment.signed_amount())),
        ("company", company),
    ]
}

fn method_name(method: &PaymentMethod, locale: &str) -> String {
    match method {
        PaymentMethod::Other(name) => name.clone(),
        _ => {
            let key = format!("method_{}", method.key());
            t!(key.as_str(), locale = locale).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::attendance::PayPeriod;
    use crate::components::salary::{
        calculate, CompanyLine, OtherPaymentKind, TierRule,
    };
    use chrono::{NaiveDate, TimeZone};

    fn worker() -> Worker {
        Worker {
            id: "w-1".to_string(),
            first_name: "Aino".to_string(),
            last_name: "Virtanen".to_string(),
            document_id: Some("123456-789A".to_string()),
            email: None,
            company_ids: vec!["acme".to_string()],
            hourly_rate: Some(20.0),
            active: true,
        }
    }

    fn input() -> SalaryInput {
        let period = PayPeriod::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap();
        let mut line = CompanyLine::hourly("acme", 20.5, 10.0);
        line.company_name = "Acme Oy".to_string();
        let mut input = SalaryInput::new(period, vec![line]);
        input.other_payments.push(OtherPayment {
            kind: OtherPaymentKind::Debt,
            label: "Tool loan".to_string(),
            amount: 5.0,
            company_id: Some("acme".to_string()),
        });
        input.payment_tiers = vec![
            TierRule::fixed(PaymentMethod::Cash, 100.0),
            TierRule::remainder(PaymentMethod::BankTransfer),
        ];
        input
    }

    fn options(locale: &str) -> ReportOptions {
        ReportOptions {
            locale: locale.to_string(),
            currency: "EUR".to_string(),
            generated_at: chrono_tz::Europe::Helsinki
                .with_ymd_and_hms(2024, 4, 2, 9, 30, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_build_values() {
        let input = input();
        let breakdown = calculate(&input).unwrap();
        let context = ReportContext::build(&worker(), &input, &breakdown, &options("en"));

        assert_eq!(context.values["worker_name"], "Aino Virtanen");
        assert_eq!(context.values["total"], "200.00 EUR");
        assert_eq!(context.values["generated_at"], "2024-04-02 09:30");
        assert_eq!(context.values["period"], "2024-03-01 - 2024-03-31");

        let companies = context.rows("companies");
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0]["company_name"], "Acme Oy");
        assert_eq!(companies[0]["weight"], "100.00 %");

        let payments = context.rows("other_payments");
        assert_eq!(payments[0]["amount"], "-5.00 EUR");
        assert_eq!(payments[0]["company"], "Acme Oy");

        let tiers = context.rows("tiers");
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[1]["amount"], "100.00 EUR");
        assert!(!tiers[1]["remainder"].is_empty());
        assert!(tiers[0]["remainder"].is_empty());
    }

    #[test]
    fn test_finnish_decimal_separator() {
        let input = input();
        let breakdown = calculate(&input).unwrap();
        let context = ReportContext::build(&worker(), &input, &breakdown, &options("fi"));
        assert_eq!(context.values["total"], "200,00 EUR");
        assert_eq!(context.rows("companies")[0]["hours"], "10,00");
    }

    #[test]
    fn test_unnamed_company_falls_back_to_id() {
        let mut input = input();
        input.companies[0].company_name = String::new();
        let breakdown = calculate(&input).unwrap();
        let context = ReportContext::build(&worker(), &input, &breakdown, &options("en"));
        assert_eq!(context.rows("companies")[0]["company_name"], "acme");
        assert_eq!(context.rows("other_payments")[0]["company"], "acme");
    }

    #[test]
    fn test_document_ids_are_unique() {
        let input = input();
        let breakdown = calculate(&input).unwrap();
        let a = ReportContext::build(&worker(), &input, &breakdown, &options("en"));
        let b = ReportContext::build(&worker(), &input, &breakdown, &options("en"));
        assert_ne!(a.values["document_id"], b.values["document_id"]);
    }
}
