pub mod allocation;
pub mod calculator;
pub mod models;
pub mod tiers;

pub use calculator::calculate;
pub use models::{
    Adjustment, CompanyAllocation, CompanyLine, DistributionBasis, OtherPayment,
    OtherPaymentKind, PayBasis, SalaryBreakdown, SalaryInput,
};
pub use tiers::{split_payment, PaymentMethod, TierAllocation, TierAmount, TierRule, TierSplit};
