use crate::{
    ledger::model::{LedgerEntry, LedgerKind},
    wallet::model::WalletKind,
    Database,
};
use async_trait::async_trait;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::FindOptions,
};
use std::sync::Arc;
use tokio_stream::StreamExt;
use utils::{AppError, AppResult};

pub type DynLedgerRepository = Arc<dyn LedgerRepositoryTrait + Send + Sync>;

/// Result of an idempotent credit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOutcome {
    Applied,
    /// The dedup key was already present; nothing changed.
    AlreadyRecorded,
}

/// Lifetime income totals per ledger kind, in cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncomeTotals {
    pub referral_cents: i64,
    pub level_cents: i64,
    pub roi_cents: i64,
    pub withdrawn_cents: i64,
}

#[async_trait]
pub trait LedgerRepositoryTrait {
    // Records the entry and credits the target wallet as one transaction.
    async fn apply_credit(&self, entry: LedgerEntry, wallet: WalletKind) -> AppResult<CreditOutcome>;

    async fn list_by_member(&self, member_id: &str, limit: i64) -> AppResult<Vec<LedgerEntry>>;

    async fn income_totals(&self, member_id: &str) -> AppResult<IncomeTotals>;
}

pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .map(|errors| errors.iter().any(|e| e.code == 11000))
            .unwrap_or(false),
        _ => false,
    }
}

#[async_trait]
impl LedgerRepositoryTrait for Database {
    async fn apply_credit(&self, entry: LedgerEntry, wallet: WalletKind) -> AppResult<CreditOutcome> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        match self
            .ledger_entries
            .insert_one_with_session(&entry, None, &mut session)
            .await
        {
            Ok(_) => {}
            Err(e) if is_duplicate_key(&e) => {
                session.abort_transaction().await.ok();
                return Ok(CreditOutcome::AlreadyRecorded);
            }
            Err(e) => {
                session.abort_transaction().await.ok();
                return Err(e.into());
            }
        }

        let update = doc! {
            "$inc": { wallet.field(): entry.amount_cents },
            "$set": { "updated_at": entry.created_at },
        };
        let updated = self
            .wallets
            .update_one_with_session(doc! { "member_id": &entry.member_id }, update, None, &mut session)
            .await;

        match updated {
            Ok(result) if result.matched_count == 1 => {
                session.commit_transaction().await?;
                Ok(CreditOutcome::Applied)
            }
            Ok(_) => {
                session.abort_transaction().await.ok();
                Err(AppError::NotFound(format!(
                    "Wallet for member {} not found.",
                    entry.member_id
                )))
            }
            Err(e) => {
                session.abort_transaction().await.ok();
                Err(e.into())
            }
        }
    }

    async fn list_by_member(&self, member_id: &str, limit: i64) -> AppResult<Vec<LedgerEntry>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .build();
        let mut cursor = self.ledger_entries.find(doc! { "member_id": member_id }, options).await?;

        let mut entries = Vec::new();
        while let Some(entry) = cursor.try_next().await? {
            entries.push(entry);
        }

        Ok(entries)
    }

    async fn income_totals(&self, member_id: &str) -> AppResult<IncomeTotals> {
        let mut cursor = self.ledger_entries.find(doc! { "member_id": member_id }, None).await?;

        let mut totals = IncomeTotals::default();
        while let Some(entry) = cursor.try_next().await? {
            match entry.kind {
                LedgerKind::ReferralBonus => totals.referral_cents += entry.amount_cents,
                LedgerKind::LevelCommission => totals.level_cents += entry.amount_cents,
                LedgerKind::RoiAccrual => totals.roi_cents += entry.amount_cents,
                LedgerKind::Withdrawal => totals.withdrawn_cents += entry.amount_cents,
            }
        }

        Ok(totals)
    }
}
