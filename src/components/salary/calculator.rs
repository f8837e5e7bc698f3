use super::allocation::{company_weights, distribute, settle_residue};
use super::models::{CompanyAllocation, SalaryBreakdown, SalaryInput};
use super::tiers::split_payment;
use crate::error::AppResult;
use crate::utils::money::round_cents;
use tracing::{debug, info};

/// Calculate the payable amount and its split across companies
pub fn calculate(input: &SalaryInput) -> AppResult<SalaryBreakdown> {
    input.validate()?;

    let base_pay: f64 = input.companies.iter().map(|l| l.base_pay()).sum();
    let overtime_pay: f64 = input.companies.iter().map(|l| l.overtime_pay()).sum();
    let bonuses: f64 = input.bonuses.iter().map(|a| a.amount).sum();
    let deductions: f64 = input.deductions.iter().map(|a| a.amount).sum();
    let gross = base_pay + overtime_pay + bonuses - deductions;

    // Untagged payments are spread by weight, tagged ones go to their company
    let untagged: f64 = input
        .other_payments
        .iter()
        .filter(|p| p.company_id.is_none())
        .map(|p| p.signed_amount())
        .sum();

    let tagged: Vec<f64> = input
        .companies
        .iter()
        .map(|line| {
            input
                .other_payments
                .iter()
                .filter(|p| p.company_id.as_deref() == Some(line.company_id.as_str()))
                .map(|p| p.signed_amount())
                .sum()
        })
        .collect();

    let other_payments_net = untagged + tagged.iter().sum::<f64>();
    let total = round_cents(gross + other_payments_net);

    let weights = company_weights(&input.companies, input.basis);

    let mut amounts = if input.redistribute {
        distribute(gross + untagged, &weights)
    } else {
        let pool = bonuses - deductions + untagged;
        input
            .companies
            .iter()
            .zip(distribute(pool, &weights))
            .map(|(line, share)| line.base_pay() + line.overtime_pay() + share)
            .collect()
    };

    for (amount, tagged_amount) in amounts.iter_mut().zip(&tagged) {
        *amount += tagged_amount;
    }
    settle_residue(&mut amounts, total);

    let companies: Vec<CompanyAllocation> = input
        .companies
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let base = round_cents(line.base_pay());
            let overtime = round_cents(line.overtime_pay());
            CompanyAllocation {
                company_id: line.company_id.clone(),
                company_name: line.company_name.clone(),
                hours: line.hours,
                overtime_hours: line.overtime_hours,
                base_pay: base,
                overtime_pay: overtime,
                earned: round_cents(base + overtime),
                weight: weights[index],
                other_payments: round_cents(tagged[index]),
                amount: amounts[index],
            }
        })
        .collect();

    let tiers = if input.payment_tiers.is_empty() {
        None
    } else {
        Some(split_payment(total, &input.payment_tiers)?)
    };

    for company in &companies {
        debug!(
            "{}: weight {:.4}, amount {:.2}",
            company.company_id, company.weight, company.amount
        );
    }
    info!(
        "Calculated salary for {} across {} companies: total {:.2}",
        input.period.format(),
        companies.len(),
        total
    );

    Ok(SalaryBreakdown {
        period: input.period,
        base_pay: round_cents(base_pay),
        overtime_pay: round_cents(overtime_pay),
        bonuses: round_cents(bonuses),
        deductions: round_cents(deductions),
        gross: round_cents(gross),
        other_payments_net: round_cents(other_payments_net),
        total,
        companies,
        tiers,
    })
}
