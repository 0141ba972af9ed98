use database::investment::model::{Investment, InvestmentStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utils::from_cents;
use utoipa::ToSchema;
use validator::Validate;

/// Confirmed deposit notification from the payment collaborator
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default, ToSchema)]
pub struct CreateInvestmentDto {
    #[validate(length(min = 1))]
    pub member_id: String,
    /// Deposited principal in account currency
    pub amount: Decimal,
}

#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct InvestmentDto {
    pub investment_id: String,
    pub owner_member_id: String,
    pub principal: Decimal,
    pub daily_rate: Decimal,
    pub status: InvestmentStatus,
    pub start_time: i64,
    pub last_accrual_time: i64,
    pub accrued_cycles: u32,
    pub total_accrued: Decimal,
}

impl From<Investment> for InvestmentDto {
    fn from(investment: Investment) -> Self {
        Self {
            investment_id: investment.investment_id,
            owner_member_id: investment.owner_member_id,
            principal: from_cents(investment.principal_cents),
            daily_rate: investment.daily_rate,
            status: investment.status,
            start_time: investment.start_time,
            last_accrual_time: investment.last_accrual_time,
            accrued_cycles: investment.accrued_cycles,
            total_accrued: from_cents(investment.total_accrued_cents),
        }
    }
}
