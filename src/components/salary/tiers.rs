//! Splitting a payable amount into payment-method tiers.
//!
//! Rules are evaluated in order. Each rule claims a fixed amount or a
//! percentage of the total, capped at what is still unclaimed. A single rule
//! may be marked as the remainder rule; it receives whatever the other rules
//! leave, wherever it sits in the list.

use crate::error::{validation_error, AppResult};
use crate::utils::money::{is_valid_quantity, round_cents};
use serde::{Deserialize, Serialize};

/// How a tier is paid out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Cash,
    Check,
    Other(String),
}

impl PaymentMethod {
    /// Stable key used for translations
    pub fn key(&self) -> &str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Check => "check",
            PaymentMethod::Other(name) => name,
        }
    }
}

/// What a tier rule claims
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TierAmount {
    Fixed(f64),
    /// Percentage of the total, 0..=100
    Percentage(f64),
}

/// One payment-method rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRule {
    pub method: PaymentMethod,
    #[serde(default)]
    pub label: Option<String>,
    pub amount: TierAmount,
    /// Absorb whatever the other rules leave
    #[serde(default)]
    pub applies_to_remainder: bool,
}

impl TierRule {
    /// Rule claiming a fixed amount
    pub fn fixed(method: PaymentMethod, amount: f64) -> Self {
        Self {
            method,
            label: None,
            amount: TierAmount::Fixed(amount),
            applies_to_remainder: false,
        }
    }

    /// Rule claiming a percentage of the total
    pub fn percentage(method: PaymentMethod, percentage: f64) -> Self {
        Self {
            method,
            label: None,
            amount: TierAmount::Percentage(percentage),
            applies_to_remainder: false,
        }
    }

    /// Rule absorbing the remainder
    pub fn remainder(method: PaymentMethod) -> Self {
        Self {
            method,
            label: None,
            amount: TierAmount::Fixed(0.0),
            applies_to_remainder: true,
        }
    }

    /// Attach a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn requested(&self, total: f64) -> f64 {
        match self.amount {
            TierAmount::Fixed(amount) => amount,
            TierAmount::Percentage(percentage) => total * percentage / 100.0,
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(validation_error("Payment method cannot be empty")),
            "bank_transfer" | "bank" => Ok(PaymentMethod::BankTransfer),
            "cash" => Ok(PaymentMethod::Cash),
            "check" => Ok(PaymentMethod::Check),
            other => Ok(PaymentMethod::Other(other.to_string())),
        }
    }
}

impl std::str::FromStr for TierRule {
    type Err = crate::error::Error;

    /// Parse `method:fixed:AMOUNT`, `method:percent:VALUE` or `method:remainder`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let parse_value = |value: &str| {
            value
                .parse::<f64>()
                .map_err(|_| validation_error(&format!("Invalid tier amount '{}'", value)))
        };

        match parts.as_slice() {
            [method, "remainder"] => Ok(TierRule::remainder(method.parse()?)),
            [method, "fixed", value] => Ok(TierRule::fixed(method.parse()?, parse_value(value)?)),
            [method, "percent" | "percentage", value] => {
                Ok(TierRule::percentage(method.parse()?, parse_value(value)?))
            }
            _ => Err(validation_error(&format!(
                "Invalid tier '{}', expected method:fixed:AMOUNT, method:percent:VALUE or method:remainder",
                s
            ))),
        }
    }
}

/// Amount assigned to one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierAllocation {
    pub method: PaymentMethod,
    pub label: Option<String>,
    pub amount: f64,
    pub is_remainder: bool,
}

/// Result of splitting a total across tier rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSplit {
    pub total: f64,
    /// One entry per rule, in rule order
    pub tiers: Vec<TierAllocation>,
    /// Amount no rule claimed; always zero with a remainder rule
    pub unassigned: f64,
}

impl TierSplit {
    /// Sum of all tier amounts
    pub fn assigned(&self) -> f64 {
        self.tiers.iter().map(|t| t.amount).sum()
    }
}

/// Check a rule list before splitting
pub fn validate_rules(rules: &[TierRule]) -> AppResult<()> {
    let remainder_rules = rules.iter().filter(|r| r.applies_to_remainder).count();
    if remainder_rules > 1 {
        return Err(validation_error(&format!(
            "Only one payment tier may apply to the remainder, found {}",
            remainder_rules
        )));
    }

    for rule in rules.iter().filter(|r| !r.applies_to_remainder) {
        match rule.amount {
            TierAmount::Fixed(amount) if !is_valid_quantity(amount) => {
                return Err(validation_error(&format!(
                    "Payment tier {} has an invalid amount: {}",
                    rule.method.key(),
                    amount
                )));
            }
            TierAmount::Percentage(percentage)
                if !is_valid_quantity(percentage) || percentage > 100.0 =>
            {
                return Err(validation_error(&format!(
                    "Payment tier {} has an invalid percentage: {}",
                    rule.method.key(),
                    percentage
                )));
            }
            _ => {}
        }
    }

    Ok(())
}

/// Split `total` across the rules
pub fn split_payment(total: f64, rules: &[TierRule]) -> AppResult<TierSplit> {
    validate_rules(rules)?;

    let total = round_cents(total);
    let mut remaining = total;
    let mut amounts = vec![0.0; rules.len()];

    for (index, rule) in rules.iter().enumerate() {
        if rule.applies_to_remainder {
            continue;
        }
        let claim = round_cents(rule.requested(total).min(remaining).max(0.0));
        amounts[index] = claim;
        remaining = round_cents(remaining - claim);
    }

    let mut unassigned = remaining;
    if let Some(index) = rules.iter().position(|r| r.applies_to_remainder) {
        amounts[index] = remaining;
        unassigned = 0.0;
    }

    let tiers = rules
        .iter()
        .zip(amounts)
        .map(|(rule, amount)| TierAllocation {
            method: rule.method.clone(),
            label: rule.label.clone(),
            amount,
            is_remainder: rule.applies_to_remainder,
        })
        .collect();

    Ok(TierSplit {
        total,
        tiers,
        unassigned,
    })
}
