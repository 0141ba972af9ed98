use crate::services::errors::{LedgerError, LedgerResult};
use async_trait::async_trait;
use chrono::Utc;
use database::{
    ledger::model::LedgerEntry,
    member::repository::{DynMemberRepository, MemberRepositoryTrait},
    wallet::repository::{DynWalletRepository, WalletRepositoryTrait},
    withdrawal::{
        model::WithdrawalRequest,
        repository::{DynWithdrawalRepository, WithdrawalRepositoryTrait},
    },
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use utils::{from_cents, to_cents, AppError, LedgerConfig};
use uuid::Uuid;

// The debit is guarded, not locked; when balances move underneath a request
// it re-reads and tries again this many times.
const DEBIT_ATTEMPTS: u32 = 3;

pub type DynWithdrawalService = Arc<dyn WithdrawalServiceTrait + Send + Sync>;

#[async_trait]
pub trait WithdrawalServiceTrait {
    async fn request_withdrawal(
        &self,
        member_id: &str,
        amount: Decimal,
        destination_address: &str,
    ) -> LedgerResult<WithdrawalRequest>;

    async fn list_withdrawals(&self, member_id: &str) -> LedgerResult<Vec<WithdrawalRequest>>;
}

#[derive(Clone)]
pub struct WithdrawalService {
    members: DynMemberRepository,
    wallets: DynWalletRepository,
    withdrawals: DynWithdrawalRepository,
    config: Arc<LedgerConfig>,
}

impl WithdrawalService {
    pub fn new(
        members: DynMemberRepository,
        wallets: DynWalletRepository,
        withdrawals: DynWithdrawalRepository,
        config: Arc<LedgerConfig>,
    ) -> Self {
        Self {
            members,
            wallets,
            withdrawals,
            config,
        }
    }
}

#[async_trait]
impl WithdrawalServiceTrait for WithdrawalService {
    async fn request_withdrawal(
        &self,
        member_id: &str,
        amount: Decimal,
        destination_address: &str,
    ) -> LedgerResult<WithdrawalRequest> {
        if amount < self.config.min_withdrawal {
            return Err(LedgerError::BelowMinimum {
                amount,
                minimum: self.config.min_withdrawal,
            });
        }
        let amount_cents = to_cents(amount)
            .filter(|cents| *cents > 0)
            .ok_or_else(|| LedgerError::Storage(AppError::BadRequest(format!("invalid amount {}", amount))))?;

        self.members
            .get_by_member_id(member_id)
            .await?
            .ok_or_else(|| LedgerError::Storage(AppError::NotFound(format!("Member {} not found.", member_id))))?;

        let mut available = 0;
        for _ in 0..DEBIT_ATTEMPTS {
            let wallet = self.wallets.get_wallet(member_id).await?.ok_or_else(|| {
                LedgerError::Storage(AppError::NotFound(format!("Wallet for member {} not found.", member_id)))
            })?;

            available = wallet.withdrawable_cents();
            if amount_cents > available {
                return Err(LedgerError::InsufficientBalance {
                    requested: from_cents(amount_cents),
                    available: from_cents(available),
                });
            }

            // the referral wallet drains first, the remainder comes from income
            let referral_debit = amount_cents.min(wallet.referral_wallet_cents);
            let income_debit = amount_cents - referral_debit;

            let now = Utc::now().timestamp();
            let request = WithdrawalRequest::pending(
                Uuid::new_v4().to_string(),
                member_id,
                amount_cents,
                destination_address,
                now,
            );
            let entry = LedgerEntry::withdrawal(member_id, &request.request_id, amount_cents, now);

            if self
                .withdrawals
                .execute_withdrawal(member_id, referral_debit, income_debit, entry, request.clone())
                .await?
            {
                if let Err(e) = self.members.set_wallet_address(member_id, destination_address).await {
                    warn!("⚠️ could not refresh payout address for {}: {}", member_id, e);
                }
                info!(
                    "📤 withdrawal {} queued: {} cents to {}",
                    request.request_id, amount_cents, destination_address
                );
                return Ok(request);
            }
            // balances moved under us; re-read and recheck
        }

        Err(LedgerError::InsufficientBalance {
            requested: from_cents(amount_cents),
            available: from_cents(available),
        })
    }

    async fn list_withdrawals(&self, member_id: &str) -> LedgerResult<Vec<WithdrawalRequest>> {
        let requests = self.withdrawals.list_by_member(member_id).await?;

        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::{test_config, MemoryStore};
    use database::withdrawal::model::WithdrawalStatus;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn service(store: &Arc<MemoryStore>) -> WithdrawalService {
        WithdrawalService::new(store.clone(), store.clone(), store.clone(), test_config())
    }

    fn seed_balance(store: &Arc<MemoryStore>, referral_cents: i64, income_cents: i64) {
        store.add_member("m-1", "P1", 1, None);
        store.set_wallet("m-1", |wallet| {
            wallet.referral_wallet_cents = referral_cents;
            wallet.income_wallet_cents = income_cents;
        });
    }

    #[tokio::test]
    async fn withdrawal_debits_referral_wallet_first() {
        let store = MemoryStore::new();
        seed_balance(&store, 300, 700);
        let service = service(&store);

        let request = service.request_withdrawal("m-1", dec("5"), "0xabc").await.unwrap();

        assert_eq!(request.status, WithdrawalStatus::Pending);
        assert_eq!(request.amount_cents, 500);
        let wallet = store.wallet("m-1").unwrap();
        assert_eq!(wallet.referral_wallet_cents, 0);
        assert_eq!(wallet.income_wallet_cents, 500);
        // destination sticks to the member for the next withdrawal form
        let member = store.state.lock().unwrap().members.get("m-1").cloned().unwrap();
        assert_eq!(member.wallet_address.as_deref(), Some("0xabc"));
    }

    #[tokio::test]
    async fn below_minimum_is_rejected_without_debit() {
        let store = MemoryStore::new();
        seed_balance(&store, 1_000, 0);
        let service = service(&store);

        let err = service.request_withdrawal("m-1", dec("0.50"), "0xabc").await.unwrap_err();

        assert!(matches!(err, LedgerError::BelowMinimum { .. }));
        assert_eq!(store.wallet("m-1").unwrap().referral_wallet_cents, 1_000);
    }

    #[tokio::test]
    async fn overdraft_is_rejected_without_debit() {
        let store = MemoryStore::new();
        seed_balance(&store, 500, 500);
        let service = service(&store);

        // withdrawable balance is $10
        let err = service.request_withdrawal("m-1", dec("15"), "0xabc").await.unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InsufficientBalance { requested, available }
                if requested == dec("15") && available == dec("10")
        ));
        let wallet = store.wallet("m-1").unwrap();
        assert_eq!(wallet.withdrawable_cents(), 1_000);
        assert!(store.state.lock().unwrap().withdrawals.is_empty());
    }

    #[tokio::test]
    async fn fund_wallet_is_never_withdrawable() {
        let store = MemoryStore::new();
        seed_balance(&store, 0, 100);
        store.set_wallet("m-1", |wallet| wallet.fund_wallet_cents = 100_000);
        let service = service(&store);

        let err = service.request_withdrawal("m-1", dec("50"), "0xabc").await.unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_withdrawals_never_overdraw() {
        let store = MemoryStore::new();
        seed_balance(&store, 2_000, 3_000);
        let service = Arc::new(service(&store));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.request_withdrawal("m-1", dec("10"), "0xabc").await.is_ok()
            }));
        }

        let mut succeeded = 0i64;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        // $50 available, $10 per request: at most five can win, and the
        // final balance accounts exactly for the ones that did
        assert!(succeeded <= 5);
        let wallet = store.wallet("m-1").unwrap();
        assert_eq!(wallet.withdrawable_cents(), 5_000 - succeeded * 1_000);
        assert!(wallet.referral_wallet_cents >= 0);
        assert!(wallet.income_wallet_cents >= 0);
        assert_eq!(store.state.lock().unwrap().withdrawals.len() as i64, succeeded);
    }
}
