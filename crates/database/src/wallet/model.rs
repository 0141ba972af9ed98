use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Per-member balances, held in minor units (cents)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct WalletAccount {
    /// MongoDB document id
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub member_id: String,
    /// Locked principal mirror, informational only
    pub fund_wallet_cents: i64,
    /// ROI accruals and level commissions
    pub income_wallet_cents: i64,
    /// One-time direct referral bonuses
    pub referral_wallet_cents: i64,
    /// Last mutation timestamp (unix seconds)
    pub updated_at: i64,
}

/// Which balance of a WalletAccount a credit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletKind {
    Fund,
    Income,
    Referral,
}

impl WalletKind {
    pub fn field(&self) -> &'static str {
        match self {
            WalletKind::Fund => "fund_wallet_cents",
            WalletKind::Income => "income_wallet_cents",
            WalletKind::Referral => "referral_wallet_cents",
        }
    }
}

impl WalletAccount {
    pub fn zero(member_id: &str, now: i64) -> Self {
        Self {
            id: None,
            member_id: member_id.to_string(),
            fund_wallet_cents: 0,
            income_wallet_cents: 0,
            referral_wallet_cents: 0,
            updated_at: now,
        }
    }

    /// Principal is never withdrawable; income and referral balances are.
    pub fn withdrawable_cents(&self) -> i64 {
        self.income_wallet_cents + self.referral_wallet_cents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdrawable_excludes_fund_wallet() {
        let mut wallet = WalletAccount::zero("m-1", 0);
        wallet.fund_wallet_cents = 10_000;
        wallet.income_wallet_cents = 300;
        wallet.referral_wallet_cents = 200;

        assert_eq!(wallet.withdrawable_cents(), 500);
    }
}
