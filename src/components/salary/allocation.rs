use super::models::{CompanyLine, DistributionBasis};
use crate::utils::money::round_cents;

/// Weight of each company, in line order. Weights sum to 1.
///
/// `Hours` uses each company's share of the worked hours and `Weight` the
/// explicit weights; both fall back to an equal split when their total is 0.
pub fn company_weights(lines: &[CompanyLine], basis: DistributionBasis) -> Vec<f64> {
    if lines.is_empty() {
        return Vec::new();
    }

    let values: Vec<f64> = match basis {
        DistributionBasis::Hours => lines.iter().map(|l| l.worked_hours()).collect(),
        DistributionBasis::Weight => lines.iter().map(|l| l.weight.unwrap_or(0.0)).collect(),
        DistributionBasis::Equal => vec![1.0; lines.len()],
    };

    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter().map(|v| v / total).collect()
    } else {
        vec![1.0 / lines.len() as f64; lines.len()]
    }
}

/// Spread `amount` by `weights`
pub fn distribute(amount: f64, weights: &[f64]) -> Vec<f64> {
    weights.iter().map(|w| amount * w).collect()
}

/// Round every amount to cents and move the rounding residue onto the last
/// entry, so the amounts add up to `total` exactly.
pub fn settle_residue(amounts: &mut [f64], total: f64) {
    for amount in amounts.iter_mut() {
        *amount = round_cents(*amount);
    }

    let allocated: f64 = amounts.iter().sum();
    let residue = round_cents(total - allocated);

    if let Some(last) = amounts.last_mut() {
        *last = round_cents(*last + residue);
    }
}
