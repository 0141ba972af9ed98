use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Credit/debit classification of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    ReferralBonus,
    LevelCommission,
    RoiAccrual,
    Withdrawal,
}

/// Immutable audit record; one per credit or debit. The dedup_key doubles
/// as the idempotency key: an insert that collides means the movement was
/// already recorded.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LedgerEntry {
    /// MongoDB document id
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub member_id: String,
    pub investment_id: Option<String>,
    pub kind: LedgerKind,
    /// Upline level, set for LevelCommission
    pub level: Option<u8>,
    /// Settlement cycles covered, set for RoiAccrual
    pub cycles: Option<u32>,
    pub amount_cents: i64,
    pub dedup_key: String,
    /// Creation timestamp (unix seconds)
    pub created_at: i64,
}

impl LedgerEntry {
    pub fn referral_bonus(member_id: &str, investment_id: &str, amount_cents: i64, now: i64) -> Self {
        Self {
            id: None,
            member_id: member_id.to_string(),
            investment_id: Some(investment_id.to_string()),
            kind: LedgerKind::ReferralBonus,
            level: None,
            cycles: None,
            amount_cents,
            dedup_key: format!("{}:referral", investment_id),
            created_at: now,
        }
    }

    pub fn level_commission(member_id: &str, investment_id: &str, level: u8, amount_cents: i64, now: i64) -> Self {
        Self {
            id: None,
            member_id: member_id.to_string(),
            investment_id: Some(investment_id.to_string()),
            kind: LedgerKind::LevelCommission,
            level: Some(level),
            cycles: None,
            amount_cents,
            dedup_key: format!("{}:level:{}", investment_id, level),
            created_at: now,
        }
    }

    /// `settled_cycles_before` is the investment's cycle count prior to this
    /// credit, which pins each catch-up batch to a unique key.
    pub fn roi_accrual(
        member_id: &str,
        investment_id: &str,
        cycles: u32,
        settled_cycles_before: u32,
        amount_cents: i64,
        now: i64,
    ) -> Self {
        Self {
            id: None,
            member_id: member_id.to_string(),
            investment_id: Some(investment_id.to_string()),
            kind: LedgerKind::RoiAccrual,
            level: None,
            cycles: Some(cycles),
            amount_cents,
            dedup_key: format!("{}:roi:{}", investment_id, settled_cycles_before),
            created_at: now,
        }
    }

    pub fn withdrawal(member_id: &str, request_id: &str, amount_cents: i64, now: i64) -> Self {
        Self {
            id: None,
            member_id: member_id.to_string(),
            investment_id: None,
            kind: LedgerKind::Withdrawal,
            level: None,
            cycles: None,
            amount_cents,
            dedup_key: format!("{}:withdraw", request_id),
            created_at: now,
        }
    }
}
