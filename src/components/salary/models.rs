use super::tiers::{TierRule, TierSplit};
use crate::components::attendance::{HoursSheet, PayPeriod};
use crate::config::{Config, DEFAULT_OVERTIME_MULTIPLIER};
use crate::error::{validation_error, AppResult};
use crate::utils::money::is_valid_quantity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a contract pays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayBasis {
    Hourly { rate: f64 },
    Monthly { amount: f64 },
}

/// One company/contract the worker is paid through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyLine {
    pub company_id: String,
    #[serde(default)]
    pub company_name: String,
    pub pay_basis: PayBasis,
    #[serde(default)]
    pub hours: f64,
    #[serde(default)]
    pub overtime_hours: f64,
    /// Falls back to the configured multiplier when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overtime_multiplier: Option<f64>,
    /// Explicit weight for `DistributionBasis::Weight`
    #[serde(default)]
    pub weight: Option<f64>,
}

impl CompanyLine {
    /// Hourly contract line
    pub fn hourly(company_id: impl Into<String>, rate: f64, hours: f64) -> Self {
        let company_id = company_id.into();
        Self {
            company_name: company_id.clone(),
            company_id,
            pay_basis: PayBasis::Hourly { rate },
            hours,
            overtime_hours: 0.0,
            overtime_multiplier: None,
            weight: None,
        }
    }

    /// Monthly contract line
    pub fn monthly(company_id: impl Into<String>, amount: f64, hours: f64) -> Self {
        let company_id = company_id.into();
        Self {
            company_name: company_id.clone(),
            company_id,
            pay_basis: PayBasis::Monthly { amount },
            hours,
            overtime_hours: 0.0,
            overtime_multiplier: None,
            weight: None,
        }
    }

    /// Hourly rate used for overtime
    pub fn hourly_rate(&self) -> f64 {
        match self.pay_basis {
            PayBasis::Hourly { rate } => rate,
            PayBasis::Monthly { amount } if self.hours > 0.0 => amount / self.hours,
            PayBasis::Monthly { .. } => 0.0,
        }
    }

    /// Pay for the regular hours
    pub fn base_pay(&self) -> f64 {
        match self.pay_basis {
            PayBasis::Hourly { rate } => self.hours * rate,
            PayBasis::Monthly { amount } => amount,
        }
    }

    /// Multiplier applied to overtime hours
    pub fn multiplier(&self) -> f64 {
        self.overtime_multiplier
            .unwrap_or(DEFAULT_OVERTIME_MULTIPLIER)
    }

    /// Pay for the overtime hours
    pub fn overtime_pay(&self) -> f64 {
        self.overtime_hours * self.hourly_rate() * self.multiplier()
    }

    /// Regular and overtime hours
    pub fn worked_hours(&self) -> f64 {
        self.hours + self.overtime_hours
    }

    fn validate(&self) -> AppResult<()> {
        let amount = match self.pay_basis {
            PayBasis::Hourly { rate } => rate,
            PayBasis::Monthly { amount } => amount,
        };

        let checks = [
            ("pay", amount),
            ("hours", self.hours),
            ("overtime hours", self.overtime_hours),
            ("overtime multiplier", self.multiplier()),
            ("weight", self.weight.unwrap_or(0.0)),
        ];

        for (name, value) in checks {
            if !is_valid_quantity(value) {
                return Err(validation_error(&format!(
                    "Company {} has an invalid {}: {}",
                    self.company_id, name, value
                )));
            }
        }

        Ok(())
    }
}

/// A bonus or deduction applied to the whole salary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub label: String,
    pub amount: f64,
}

/// Kinds of payments made outside the contract pay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtherPaymentKind {
    Supplement,
    Bonus,
    Discount,
    Debt,
    Deduction,
}

impl OtherPaymentKind {
    /// +1 for payments that add to the salary, -1 for ones that subtract
    pub fn sign(&self) -> f64 {
        match self {
            OtherPaymentKind::Supplement | OtherPaymentKind::Bonus => 1.0,
            OtherPaymentKind::Discount | OtherPaymentKind::Debt | OtherPaymentKind::Deduction => {
                -1.0
            }
        }
    }

    /// Stable key used for translations
    pub fn key(&self) -> &'static str {
        match self {
            OtherPaymentKind::Supplement => "supplement",
            OtherPaymentKind::Bonus => "bonus",
            OtherPaymentKind::Discount => "discount",
            OtherPaymentKind::Debt => "debt",
            OtherPaymentKind::Deduction => "deduction",
        }
    }
}

/// Supplement, bonus, discount, debt or deduction, optionally tied to a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherPayment {
    pub kind: OtherPaymentKind,
    #[serde(default)]
    pub label: String,
    /// Magnitude; the kind decides the sign
    pub amount: f64,
    #[serde(default)]
    pub company_id: Option<String>,
}

impl OtherPayment {
    /// Amount with the sign of its kind applied
    pub fn signed_amount(&self) -> f64 {
        self.kind.sign() * self.amount
    }
}

/// What the amount is spread across companies by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistributionBasis {
    #[default]
    Hours,
    Weight,
    Equal,
}

/// Everything needed to calculate one salary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryInput {
    pub period: PayPeriod,
    pub companies: Vec<CompanyLine>,
    #[serde(default)]
    pub bonuses: Vec<Adjustment>,
    #[serde(default)]
    pub deductions: Vec<Adjustment>,
    #[serde(default)]
    pub other_payments: Vec<OtherPayment>,
    /// Spread the whole amount across companies instead of keeping each company's own pay
    #[serde(default)]
    pub redistribute: bool,
    #[serde(default)]
    pub basis: DistributionBasis,
    #[serde(default)]
    pub payment_tiers: Vec<TierRule>,
}

impl SalaryInput {
    /// Create an input with no adjustments
    pub fn new(period: PayPeriod, companies: Vec<CompanyLine>) -> Self {
        Self {
            period,
            companies,
            bonuses: Vec::new(),
            deductions: Vec::new(),
            other_payments: Vec::new(),
            redistribute: false,
            basis: DistributionBasis::Hours,
            payment_tiers: Vec::new(),
        }
    }

    /// Fill settings the input leaves open from the configuration
    pub fn apply_defaults(&mut self, config: &Config) {
        for line in &mut self.companies {
            line.overtime_multiplier
                .get_or_insert(config.overtime_multiplier);
        }
    }

    /// Copy hours from an hours sheet onto matching company lines
    pub fn apply_hours(&mut self, sheet: &HoursSheet) {
        for line in &mut self.companies {
            if let Some(entry) = sheet.get(&line.company_id) {
                line.hours = entry.hours;
                line.overtime_hours = entry.overtime_hours;
            }
        }
    }

    /// Check the input before calculating
    pub fn validate(&self) -> AppResult<()> {
        if self.companies.is_empty() {
            return Err(validation_error("At least one company is required"));
        }

        let mut seen = HashSet::new();
        for line in &self.companies {
            if !seen.insert(line.company_id.as_str()) {
                return Err(validation_error(&format!(
                    "Company {} is listed more than once",
                    line.company_id
                )));
            }
            line.validate()?;
        }

        for adjustment in self.bonuses.iter().chain(self.deductions.iter()) {
            if !is_valid_quantity(adjustment.amount) {
                return Err(validation_error(&format!(
                    "Adjustment '{}' has an invalid amount: {}",
                    adjustment.label, adjustment.amount
                )));
            }
        }

        for payment in &self.other_payments {
            if !is_valid_quantity(payment.amount) {
                return Err(validation_error(&format!(
                    "Payment '{}' has an invalid amount: {}",
                    payment.label, payment.amount
                )));
            }
            if let Some(company_id) = &payment.company_id {
                if !seen.contains(company_id.as_str()) {
                    return Err(validation_error(&format!(
                        "Payment '{}' is tagged to unknown company {}",
                        payment.label, company_id
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Result line for one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyAllocation {
    pub company_id: String,
    pub company_name: String,
    pub hours: f64,
    pub overtime_hours: f64,
    pub base_pay: f64,
    pub overtime_pay: f64,
    /// Base plus overtime pay
    pub earned: f64,
    /// Share of the distributed amount, 0..=1
    pub weight: f64,
    /// Net of the other payments tagged to this company
    pub other_payments: f64,
    /// Final payable amount
    pub amount: f64,
}

/// Full result of a salary calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryBreakdown {
    pub period: PayPeriod,
    pub base_pay: f64,
    pub overtime_pay: f64,
    pub bonuses: f64,
    pub deductions: f64,
    /// Base + overtime + bonuses - deductions
    pub gross: f64,
    /// Net of all other payments
    pub other_payments_net: f64,
    pub total: f64,
    pub companies: Vec<CompanyAllocation>,
    #[serde(default)]
    pub tiers: Option<TierSplit>,
}

impl SalaryBreakdown {
    /// Sum of the company amounts
    pub fn allocated(&self) -> f64 {
        self.companies.iter().map(|c| c.amount).sum()
    }
}
