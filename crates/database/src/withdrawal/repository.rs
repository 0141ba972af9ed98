use crate::{
    ledger::{model::LedgerEntry, repository::is_duplicate_key},
    withdrawal::model::WithdrawalRequest,
    Database,
};
use async_trait::async_trait;
use mongodb::{bson::doc, options::FindOptions};
use std::sync::Arc;
use tokio_stream::StreamExt;
use utils::AppResult;

pub type DynWithdrawalRepository = Arc<dyn WithdrawalRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait WithdrawalRepositoryTrait {
    // Debits both wallets, records the ledger entry and emits the Pending
    // request as one transaction. Returns false when the balance guards
    // reject the debit (the caller re-reads and retries).
    async fn execute_withdrawal(
        &self,
        member_id: &str,
        referral_debit_cents: i64,
        income_debit_cents: i64,
        entry: LedgerEntry,
        request: WithdrawalRequest,
    ) -> AppResult<bool>;

    async fn list_by_member(&self, member_id: &str) -> AppResult<Vec<WithdrawalRequest>>;
}

#[async_trait]
impl WithdrawalRepositoryTrait for Database {
    async fn execute_withdrawal(
        &self,
        member_id: &str,
        referral_debit_cents: i64,
        income_debit_cents: i64,
        entry: LedgerEntry,
        request: WithdrawalRequest,
    ) -> AppResult<bool> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        // Both guards sit in the filter, so a concurrent debit that drained
        // either wallet turns this into a no-match instead of an overdraft.
        let filter = doc! {
            "member_id": member_id,
            "referral_wallet_cents": { "$gte": referral_debit_cents },
            "income_wallet_cents": { "$gte": income_debit_cents },
        };
        let update = doc! {
            "$inc": {
                "referral_wallet_cents": -referral_debit_cents,
                "income_wallet_cents": -income_debit_cents,
            },
            "$set": { "updated_at": entry.created_at },
        };
        let debited = self
            .wallets
            .update_one_with_session(filter, update, None, &mut session)
            .await;

        match debited {
            Ok(result) if result.matched_count == 1 => {}
            Ok(_) => {
                session.abort_transaction().await.ok();
                return Ok(false);
            }
            Err(e) => {
                session.abort_transaction().await.ok();
                return Err(e.into());
            }
        }

        match self
            .ledger_entries
            .insert_one_with_session(&entry, None, &mut session)
            .await
        {
            Ok(_) => {}
            Err(e) if is_duplicate_key(&e) => {
                // same request id already executed; keep the earlier debit
                session.abort_transaction().await.ok();
                return Ok(true);
            }
            Err(e) => {
                session.abort_transaction().await.ok();
                return Err(e.into());
            }
        }

        if let Err(e) = self
            .withdrawal_requests
            .insert_one_with_session(&request, None, &mut session)
            .await
        {
            session.abort_transaction().await.ok();
            return Err(e.into());
        }

        session.commit_transaction().await?;
        Ok(true)
    }

    async fn list_by_member(&self, member_id: &str) -> AppResult<Vec<WithdrawalRequest>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let mut cursor = self
            .withdrawal_requests
            .find(doc! { "member_id": member_id }, options)
            .await?;

        let mut requests = Vec::new();
        while let Some(request) = cursor.try_next().await? {
            requests.push(request);
        }

        Ok(requests)
    }
}
