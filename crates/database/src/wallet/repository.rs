use crate::{
    wallet::model::{WalletAccount, WalletKind},
    Database,
};
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::doc;
use std::sync::Arc;
use utils::{AppError, AppResult};

pub type DynWalletRepository = Arc<dyn WalletRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait WalletRepositoryTrait {
    // Created alongside the member with zero balances.
    async fn create_wallet(&self, member_id: &str) -> AppResult<WalletAccount>;

    async fn get_wallet(&self, member_id: &str) -> AppResult<Option<WalletAccount>>;

    // Applies a positive delta to one balance; append-only, never a read-modify-write.
    async fn credit(&self, member_id: &str, kind: WalletKind, amount_cents: i64) -> AppResult<()>;
}

#[async_trait]
impl WalletRepositoryTrait for Database {
    async fn create_wallet(&self, member_id: &str) -> AppResult<WalletAccount> {
        let existing = self.wallets.find_one(doc! { "member_id": member_id }, None).await?;

        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "Wallet for member {} already exists.",
                member_id
            )));
        }

        let wallet = WalletAccount::zero(member_id, Utc::now().timestamp());
        self.wallets.insert_one(&wallet, None).await?;

        Ok(wallet)
    }

    async fn get_wallet(&self, member_id: &str) -> AppResult<Option<WalletAccount>> {
        let filter = doc! { "member_id": member_id };
        let wallet = self.wallets.find_one(filter, None).await?;

        Ok(wallet)
    }

    async fn credit(&self, member_id: &str, kind: WalletKind, amount_cents: i64) -> AppResult<()> {
        if amount_cents <= 0 {
            return Err(AppError::BadRequest(format!(
                "Wallet credit must be positive, got {}.",
                amount_cents
            )));
        }

        let update = doc! {
            "$inc": { kind.field(): amount_cents },
            "$set": { "updated_at": Utc::now().timestamp() },
        };

        let updated = self
            .wallets
            .update_one(doc! { "member_id": member_id }, update, None)
            .await?;

        if updated.matched_count == 0 {
            return Err(AppError::NotFound(format!("Wallet for member {} not found.", member_id)));
        }

        Ok(())
    }
}
