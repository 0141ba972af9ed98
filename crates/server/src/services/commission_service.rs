use crate::services::errors::{LedgerError, LedgerResult};
use chrono::Utc;
use database::{
    investment::{
        model::Investment,
        repository::{DynInvestmentRepository, InvestmentRepositoryTrait},
    },
    ledger::{
        model::LedgerEntry,
        repository::{CreditOutcome, DynLedgerRepository, LedgerRepositoryTrait},
    },
    member::{
        model::Member,
        repository::{DynMemberRepository, MemberRepositoryTrait},
    },
    wallet::model::WalletKind,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use utils::{from_cents, rate_of_cents, AppError, LedgerConfig, LevelRate};

/// What one distribution run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommissionReport {
    pub applied_count: u32,
    pub applied_cents: i64,
    pub already_recorded: u32,
    pub skipped_ineligible: u32,
}

/// Distributes referral and level commissions for confirmed investments.
/// Every credit is guarded by a ledger dedup key, so a rerun after a crash
/// resumes exactly where the first run stopped.
#[derive(Clone)]
pub struct CommissionService {
    members: DynMemberRepository,
    investments: DynInvestmentRepository,
    ledger: DynLedgerRepository,
    config: Arc<LedgerConfig>,
}

impl CommissionService {
    pub fn new(
        members: DynMemberRepository,
        investments: DynInvestmentRepository,
        ledger: DynLedgerRepository,
        config: Arc<LedgerConfig>,
    ) -> Self {
        Self {
            members,
            investments,
            ledger,
            config,
        }
    }

    fn share(&self, principal_cents: i64, rate: Decimal) -> LedgerResult<i64> {
        rate_of_cents(principal_cents, rate)
            .ok_or_else(|| LedgerError::Storage(AppError::BadRequest("commission amount out of range".to_string())))
    }

    // Level eligibility: enough personal active principal on record.
    async fn is_eligible(&self, upline: &Member, level_rate: &LevelRate) -> LedgerResult<bool> {
        let personal_cents = self
            .investments
            .total_active_principal_cents(&upline.member_id)
            .await?;

        Ok(from_cents(personal_cents) >= level_rate.min_personal_investment)
    }

    pub async fn distribute(&self, investment: &Investment) -> LedgerResult<CommissionReport> {
        let owner = self
            .members
            .get_by_member_id(&investment.owner_member_id)
            .await?
            .ok_or_else(|| LedgerError::OwnerNotFound(investment.owner_member_id.clone()))?;

        let chain = self
            .members
            .sponsor_chain(&owner.member_id, self.config.payable_levels())
            .await?;

        let mut report = CommissionReport::default();
        let mut attempted = 0u32;
        let now = Utc::now().timestamp();

        // one-time bonus for the direct sponsor
        if let Some(sponsor) = chain.first() {
            let amount = self.share(investment.principal_cents, self.config.referral_rate)?;
            if amount > 0 {
                attempted += 1;
                let entry = LedgerEntry::referral_bonus(&sponsor.member_id, &investment.investment_id, amount, now);
                match self.ledger.apply_credit(entry, WalletKind::Referral).await? {
                    CreditOutcome::Applied => {
                        report.applied_count += 1;
                        report.applied_cents += amount;
                    }
                    CreditOutcome::AlreadyRecorded => report.already_recorded += 1,
                }
            }
        }

        // override commissions for levels 1..=N; chain position L is the
        // owner's Lth-generation upline
        for (index, level_rate) in self.config.level_rates.iter().enumerate() {
            let Some(upline) = chain.get(index) else {
                // ran out of upline; fewer credits, not an error
                break;
            };
            let level = (index + 1) as u8;

            if !self.is_eligible(upline, level_rate).await? {
                // skipped without reassignment; the walk continues
                report.skipped_ineligible += 1;
                continue;
            }

            let amount = self.share(investment.principal_cents, level_rate.rate)?;
            if amount == 0 {
                continue;
            }
            attempted += 1;
            let entry =
                LedgerEntry::level_commission(&upline.member_id, &investment.investment_id, level, amount, now);
            match self.ledger.apply_credit(entry, WalletKind::Income).await? {
                CreditOutcome::Applied => {
                    report.applied_count += 1;
                    report.applied_cents += amount;
                }
                CreditOutcome::AlreadyRecorded => report.already_recorded += 1,
            }
        }

        if attempted > 0 && report.applied_count == 0 && report.already_recorded == attempted {
            return Err(LedgerError::InvestmentAlreadyProcessed(investment.investment_id.clone()));
        }

        if report.applied_count > 0 {
            info!(
                "💸 investment {}: {} commission credits, {} cents",
                investment.investment_id, report.applied_count, report.applied_cents
            );
        }

        Ok(report)
    }
}
