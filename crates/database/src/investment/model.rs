use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    Active,
    Completed,
}

impl InvestmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentStatus::Active => "active",
            InvestmentStatus::Completed => "completed",
        }
    }
}

/// A confirmed deposit of principal, kept forever as a historical record.
/// Accrual fields are only ever advanced by the settlement path.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct Investment {
    /// MongoDB document id
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub investment_id: String,
    pub owner_member_id: String,
    /// Deposited principal in cents, always positive
    pub principal_cents: i64,
    /// Fraction of principal credited per settlement cycle, frozen at creation
    pub daily_rate: Decimal,
    pub status: InvestmentStatus,
    /// Deposit confirmation time (unix seconds)
    pub start_time: i64,
    /// End of the last settled cycle; starts at start_time so the partial
    /// cycle before creation never accrues
    pub last_accrual_time: i64,
    /// Whole cycles settled so far
    pub accrued_cycles: u32,
    pub total_accrued_cents: i64,
}

impl Investment {
    pub fn new(investment_id: String, owner_member_id: &str, principal_cents: i64, daily_rate: Decimal, now: i64) -> Self {
        Self {
            id: None,
            investment_id,
            owner_member_id: owner_member_id.to_string(),
            principal_cents,
            daily_rate,
            status: InvestmentStatus::Active,
            start_time: now,
            last_accrual_time: now,
            accrued_cycles: 0,
            total_accrued_cents: 0,
        }
    }
}
