use crate::services::{
    commission_service::CommissionService,
    errors::{LedgerError, LedgerResult},
};
use async_trait::async_trait;
use chrono::Utc;
use database::{
    investment::{
        model::Investment,
        repository::{DynInvestmentRepository, InvestmentRepositoryTrait},
    },
    member::repository::{DynMemberRepository, MemberRepositoryTrait},
    wallet::{
        model::WalletKind,
        repository::{DynWalletRepository, WalletRepositoryTrait},
    },
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};
use utils::{to_cents, AppError, LedgerConfig};
use uuid::Uuid;

pub type DynInvestmentService = Arc<dyn InvestmentServiceTrait + Send + Sync>;

#[async_trait]
pub trait InvestmentServiceTrait {
    // Entry point for a confirmed deposit; the payment gateway itself is an
    // external collaborator.
    async fn create_investment(&self, member_id: &str, amount: Decimal) -> LedgerResult<Investment>;

    async fn list_investments(&self, member_id: &str) -> LedgerResult<Vec<Investment>>;
}

#[derive(Clone)]
pub struct InvestmentService {
    members: DynMemberRepository,
    investments: DynInvestmentRepository,
    wallets: DynWalletRepository,
    commission: Arc<CommissionService>,
    config: Arc<LedgerConfig>,
}

impl InvestmentService {
    pub fn new(
        members: DynMemberRepository,
        investments: DynInvestmentRepository,
        wallets: DynWalletRepository,
        commission: Arc<CommissionService>,
        config: Arc<LedgerConfig>,
    ) -> Self {
        Self {
            members,
            investments,
            wallets,
            commission,
            config,
        }
    }
}

#[async_trait]
impl InvestmentServiceTrait for InvestmentService {
    async fn create_investment(&self, member_id: &str, amount: Decimal) -> LedgerResult<Investment> {
        let owner = self
            .members
            .get_by_member_id(member_id)
            .await?
            .ok_or_else(|| LedgerError::OwnerNotFound(member_id.to_string()))?;

        if amount < self.config.min_investment {
            return Err(LedgerError::BelowMinimum {
                amount,
                minimum: self.config.min_investment,
            });
        }
        let principal_cents = to_cents(amount)
            .filter(|cents| *cents > 0)
            .ok_or_else(|| LedgerError::Storage(AppError::BadRequest(format!("invalid amount {}", amount))))?;

        let investment = Investment::new(
            Uuid::new_v4().to_string(),
            &owner.member_id,
            principal_cents,
            self.config.daily_roi_rate,
            Utc::now().timestamp(),
        );
        let investment = self.investments.create_investment(investment).await?;

        // locked principal mirror; informational, never withdrawable
        self.wallets
            .credit(&owner.member_id, WalletKind::Fund, principal_cents)
            .await?;

        // The investment stands on its own: distribution is idempotent, so a
        // failure here is logged and the rerun picks up the missing credits.
        match self.commission.distribute(&investment).await {
            Ok(report) => info!(
                "✅ investment {} confirmed, {} commission credits applied",
                investment.investment_id, report.applied_count
            ),
            Err(LedgerError::InvestmentAlreadyProcessed(id)) => {
                warn!("⚠️ commission run for investment {} was already recorded", id)
            }
            Err(e) => error!(
                "🔴 commission distribution for investment {} incomplete: {}",
                investment.investment_id, e
            ),
        }

        Ok(investment)
    }

    async fn list_investments(&self, member_id: &str) -> LedgerResult<Vec<Investment>> {
        let investments = self.investments.list_by_owner(member_id).await?;

        Ok(investments)
    }
}
