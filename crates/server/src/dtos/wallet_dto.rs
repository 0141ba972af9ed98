use crate::services::wallet_service::MemberSummary;
use database::ledger::model::{LedgerEntry, LedgerKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utils::from_cents;
use utoipa::ToSchema;

/// Dashboard numbers for one member; exact decimals, formatting is the
/// presentation layer's concern
#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct MemberSummaryDto {
    pub fund_wallet: Decimal,
    pub income_wallet: Decimal,
    pub referral_wallet: Decimal,
    pub withdrawable: Decimal,
    pub total_invested: Decimal,
    pub daily_earnings: Decimal,
    pub referral_income: Decimal,
    pub level_income: Decimal,
    pub roi_income: Decimal,
    pub total_withdrawn: Decimal,
}

impl From<MemberSummary> for MemberSummaryDto {
    fn from(summary: MemberSummary) -> Self {
        Self {
            fund_wallet: summary.fund_wallet,
            income_wallet: summary.income_wallet,
            referral_wallet: summary.referral_wallet,
            withdrawable: summary.withdrawable,
            total_invested: summary.total_invested,
            daily_earnings: summary.daily_earnings,
            referral_income: summary.referral_income,
            level_income: summary.level_income,
            roi_income: summary.roi_income,
            total_withdrawn: summary.total_withdrawn,
        }
    }
}

/// One audit-trail line
#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct LedgerEntryDto {
    pub kind: LedgerKind,
    pub level: Option<u8>,
    pub cycles: Option<u32>,
    pub amount: Decimal,
    pub investment_id: Option<String>,
    pub created_at: i64,
}

impl From<LedgerEntry> for LedgerEntryDto {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            kind: entry.kind,
            level: entry.level,
            cycles: entry.cycles,
            amount: from_cents(entry.amount_cents),
            investment_id: entry.investment_id,
            created_at: entry.created_at,
        }
    }
}
