use crate::services::errors::{LedgerError, LedgerResult};
use async_trait::async_trait;
use database::{
    investment::repository::{DynInvestmentRepository, InvestmentRepositoryTrait},
    ledger::{
        model::LedgerEntry,
        repository::{DynLedgerRepository, LedgerRepositoryTrait},
    },
    wallet::{
        model::WalletAccount,
        repository::{DynWalletRepository, WalletRepositoryTrait},
    },
};
use rust_decimal::Decimal;
use std::sync::Arc;
use utils::{from_cents, rate_of_cents, AppError, LedgerConfig};

pub type DynWalletService = Arc<dyn WalletServiceTrait + Send + Sync>;

/// The dashboard numbers for one member, as exact decimals
#[derive(Debug, Clone, PartialEq)]
pub struct MemberSummary {
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

#[async_trait]
pub trait WalletServiceTrait {
    async fn balances(&self, member_id: &str) -> LedgerResult<WalletAccount>;

    async fn member_summary(&self, member_id: &str) -> LedgerResult<MemberSummary>;

    async fn ledger_history(&self, member_id: &str, limit: i64) -> LedgerResult<Vec<LedgerEntry>>;
}

#[derive(Clone)]
pub struct WalletService {
    wallets: DynWalletRepository,
    ledger: DynLedgerRepository,
    investments: DynInvestmentRepository,
    config: Arc<LedgerConfig>,
}

impl WalletService {
    pub fn new(
        wallets: DynWalletRepository,
        ledger: DynLedgerRepository,
        investments: DynInvestmentRepository,
        config: Arc<LedgerConfig>,
    ) -> Self {
        Self {
            wallets,
            ledger,
            investments,
            config,
        }
    }
}

#[async_trait]
impl WalletServiceTrait for WalletService {
    async fn balances(&self, member_id: &str) -> LedgerResult<WalletAccount> {
        self.wallets
            .get_wallet(member_id)
            .await?
            .ok_or_else(|| LedgerError::Storage(AppError::NotFound(format!("Wallet for member {} not found.", member_id))))
    }

    async fn member_summary(&self, member_id: &str) -> LedgerResult<MemberSummary> {
        let wallet = self.balances(member_id).await?;
        let totals = self.ledger.income_totals(member_id).await?;
        let invested_cents = self.investments.total_active_principal_cents(member_id).await?;
        let daily_cents = rate_of_cents(invested_cents, self.config.daily_roi_rate).unwrap_or(0);

        Ok(MemberSummary {
            fund_wallet: from_cents(wallet.fund_wallet_cents),
            income_wallet: from_cents(wallet.income_wallet_cents),
            referral_wallet: from_cents(wallet.referral_wallet_cents),
            withdrawable: from_cents(wallet.withdrawable_cents()),
            total_invested: from_cents(invested_cents),
            daily_earnings: from_cents(daily_cents),
            referral_income: from_cents(totals.referral_cents),
            level_income: from_cents(totals.level_cents),
            roi_income: from_cents(totals.roi_cents),
            total_withdrawn: from_cents(totals.withdrawn_cents),
        })
    }

    async fn ledger_history(&self, member_id: &str, limit: i64) -> LedgerResult<Vec<LedgerEntry>> {
        let entries = self.ledger.list_by_member(member_id, limit).await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::{test_config, MemoryStore};
    use database::wallet::model::WalletKind;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn service(store: &Arc<MemoryStore>) -> WalletService {
        WalletService::new(store.clone(), store.clone(), store.clone(), test_config())
    }

    #[tokio::test]
    async fn summary_reflects_wallets_ledger_and_investments() {
        let store = MemoryStore::new();
        store.add_member("m-1", "P1", 1, None);
        store.add_investment("inv-1", "m-1", 10_000);
        store.record_entry(LedgerEntry::referral_bonus("m-1", "inv-x", 500, 0), WalletKind::Referral);
        store.record_entry(LedgerEntry::level_commission("m-1", "inv-y", 1, 300, 0), WalletKind::Income);
        store.record_entry(LedgerEntry::roi_accrual("m-1", "inv-1", 1, 0, 200, 0), WalletKind::Income);
        let service = service(&store);

        let summary = service.member_summary("m-1").await.unwrap();

        assert_eq!(summary.referral_wallet, dec("5.00"));
        assert_eq!(summary.income_wallet, dec("5.00"));
        assert_eq!(summary.withdrawable, dec("10.00"));
        assert_eq!(summary.total_invested, dec("100.00"));
        assert_eq!(summary.daily_earnings, dec("2.00"));
        assert_eq!(summary.referral_income, dec("5.00"));
        assert_eq!(summary.level_income, dec("3.00"));
        assert_eq!(summary.roi_income, dec("2.00"));
        assert_eq!(summary.total_withdrawn, dec("0.00"));
    }

    #[tokio::test]
    async fn missing_wallet_is_not_found() {
        let store = MemoryStore::new();
        let service = service(&store);

        let err = service.member_summary("ghost").await.unwrap_err();

        assert!(matches!(err, LedgerError::Storage(AppError::NotFound(_))));
    }
}
