use crate::{
    investment::model::{Investment, InvestmentStatus},
    ledger::{model::LedgerEntry, repository::is_duplicate_key},
    wallet::model::WalletKind,
    Database,
};
use async_trait::async_trait;
use mongodb::bson::doc;
use std::sync::Arc;
use tokio_stream::StreamExt;
use utils::{AppError, AppResult};

pub type DynInvestmentRepository = Arc<dyn InvestmentRepositoryTrait + Send + Sync>;

/// One planned settlement step for a single investment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualAdvance {
    /// Whole cycles credited by this step
    pub cycles: u32,
    pub amount_cents: i64,
    /// Whether this step exhausts the configured accrual limit
    pub completes: bool,
    /// last_accrual_time advanced by exactly `cycles`, never to "now"
    pub new_last_accrual_time: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualOutcome {
    Applied,
    /// The ledger already holds this batch; nothing changed.
    AlreadyRecorded,
    /// The investment advanced under us; the next pass recomputes.
    Stale,
}

#[async_trait]
pub trait InvestmentRepositoryTrait {
    async fn create_investment(&self, investment: Investment) -> AppResult<Investment>;

    async fn get_investment(&self, investment_id: &str) -> AppResult<Option<Investment>>;

    async fn list_by_owner(&self, member_id: &str) -> AppResult<Vec<Investment>>;

    async fn list_active(&self) -> AppResult<Vec<Investment>>;

    // Sum of active principal; feeds the level eligibility predicate.
    async fn total_active_principal_cents(&self, member_id: &str) -> AppResult<i64>;

    // Applies one settlement step: ledger entry (when the step credits
    // anything), investment advance, and income-wallet credit, atomically.
    // The filter on the observed cycle count makes concurrent passes safe.
    async fn apply_accrual(
        &self,
        investment: &Investment,
        advance: &AccrualAdvance,
        entry: Option<LedgerEntry>,
    ) -> AppResult<AccrualOutcome>;
}

#[async_trait]
impl InvestmentRepositoryTrait for Database {
    async fn create_investment(&self, investment: Investment) -> AppResult<Investment> {
        if investment.principal_cents <= 0 {
            return Err(AppError::BadRequest(format!(
                "Investment principal must be positive, got {}.",
                investment.principal_cents
            )));
        }

        self.investments.insert_one(&investment, None).await?;

        Ok(investment)
    }

    async fn get_investment(&self, investment_id: &str) -> AppResult<Option<Investment>> {
        let filter = doc! { "investment_id": investment_id };
        let investment = self.investments.find_one(filter, None).await?;

        Ok(investment)
    }

    async fn list_by_owner(&self, member_id: &str) -> AppResult<Vec<Investment>> {
        let mut cursor = self
            .investments
            .find(doc! { "owner_member_id": member_id }, None)
            .await?;

        let mut investments = Vec::new();
        while let Some(investment) = cursor.try_next().await? {
            investments.push(investment);
        }

        Ok(investments)
    }

    async fn list_active(&self) -> AppResult<Vec<Investment>> {
        let filter = doc! { "status": InvestmentStatus::Active.as_str() };
        let mut cursor = self.investments.find(filter, None).await?;

        let mut investments = Vec::new();
        while let Some(investment) = cursor.try_next().await? {
            investments.push(investment);
        }

        Ok(investments)
    }

    async fn total_active_principal_cents(&self, member_id: &str) -> AppResult<i64> {
        let filter = doc! {
            "owner_member_id": member_id,
            "status": InvestmentStatus::Active.as_str(),
        };
        let mut cursor = self.investments.find(filter, None).await?;

        let mut total = 0i64;
        while let Some(investment) = cursor.try_next().await? {
            total += investment.principal_cents;
        }

        Ok(total)
    }

    async fn apply_accrual(
        &self,
        investment: &Investment,
        advance: &AccrualAdvance,
        entry: Option<LedgerEntry>,
    ) -> AppResult<AccrualOutcome> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        if let Some(entry) = &entry {
            match self
                .ledger_entries
                .insert_one_with_session(entry, None, &mut session)
                .await
            {
                Ok(_) => {}
                Err(e) if is_duplicate_key(&e) => {
                    session.abort_transaction().await.ok();
                    return Ok(AccrualOutcome::AlreadyRecorded);
                }
                Err(e) => {
                    session.abort_transaction().await.ok();
                    return Err(e.into());
                }
            }
        }

        let status = if advance.completes {
            InvestmentStatus::Completed
        } else {
            investment.status
        };
        let filter = doc! {
            "investment_id": &investment.investment_id,
            // only advance from the state this pass observed
            "accrued_cycles": investment.accrued_cycles as i64,
        };
        let update = doc! {
            "$set": {
                "last_accrual_time": advance.new_last_accrual_time,
                "status": status.as_str(),
            },
            "$inc": {
                "accrued_cycles": advance.cycles as i64,
                "total_accrued_cents": advance.amount_cents,
            },
        };
        let updated = self
            .investments
            .update_one_with_session(filter, update, None, &mut session)
            .await;

        match updated {
            Ok(result) if result.matched_count == 1 => {}
            Ok(_) => {
                session.abort_transaction().await.ok();
                return Ok(AccrualOutcome::Stale);
            }
            Err(e) => {
                session.abort_transaction().await.ok();
                return Err(e.into());
            }
        }

        if advance.amount_cents > 0 {
            let update = doc! {
                "$inc": { WalletKind::Income.field(): advance.amount_cents },
                "$set": { "updated_at": advance.new_last_accrual_time },
            };
            let credited = self
                .wallets
                .update_one_with_session(
                    doc! { "member_id": &investment.owner_member_id },
                    update,
                    None,
                    &mut session,
                )
                .await;

            match credited {
                Ok(result) if result.matched_count == 1 => {}
                Ok(_) => {
                    session.abort_transaction().await.ok();
                    return Err(AppError::NotFound(format!(
                        "Wallet for member {} not found.",
                        investment.owner_member_id
                    )));
                }
                Err(e) => {
                    session.abort_transaction().await.ok();
                    return Err(e.into());
                }
            }
        }

        session.commit_transaction().await?;
        Ok(AccrualOutcome::Applied)
    }
}
