use async_trait::async_trait;
use chrono::Utc;
use database::{
    investment::{
        model::{Investment, InvestmentStatus},
        repository::{AccrualAdvance, AccrualOutcome, DynInvestmentRepository, InvestmentRepositoryTrait},
    },
    ledger::model::LedgerEntry,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info};
use utils::{rate_of_cents, AccrualLimit, AppResult, LedgerConfig};

pub type DynAccrualService = Arc<dyn AccrualServiceTrait + Send + Sync>;

/// Tally of one settlement pass over all active investments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettlementReport {
    pub scanned: usize,
    pub settled: usize,
    pub completed: usize,
    pub credited_cents: i64,
    pub failed: usize,
}

#[async_trait]
pub trait AccrualServiceTrait {
    async fn settle_due_investments(&self) -> AppResult<SettlementReport>;
}

/// Credits the daily return for every whole settlement cycle elapsed since
/// each investment's own last accrual. Downtime is caught up from persisted
/// state, so running the pass late, twice, or concurrently never double- or
/// under-credits.
#[derive(Clone)]
pub struct AccrualService {
    investments: DynInvestmentRepository,
    config: Arc<LedgerConfig>,
}

impl AccrualService {
    pub fn new(investments: DynInvestmentRepository, config: Arc<LedgerConfig>) -> Self {
        Self { investments, config }
    }

    async fn settle_investment(&self, investment: &Investment, now: i64) -> AppResult<Option<AccrualAdvance>> {
        let Some(advance) = plan_accrual(investment, now, &self.config) else {
            return Ok(None);
        };

        let entry = (advance.amount_cents > 0).then(|| {
            LedgerEntry::roi_accrual(
                &investment.owner_member_id,
                &investment.investment_id,
                advance.cycles,
                investment.accrued_cycles,
                advance.amount_cents,
                now,
            )
        });

        match self.investments.apply_accrual(investment, &advance, entry).await? {
            AccrualOutcome::Applied => Ok(Some(advance)),
            // another pass observed this batch first; the next one recomputes
            AccrualOutcome::AlreadyRecorded | AccrualOutcome::Stale => Ok(None),
        }
    }
}

#[async_trait]
impl AccrualServiceTrait for AccrualService {
    async fn settle_due_investments(&self) -> AppResult<SettlementReport> {
        let now = Utc::now().timestamp();
        let active = self.investments.list_active().await?;

        let mut report = SettlementReport {
            scanned: active.len(),
            ..Default::default()
        };

        for investment in active {
            // one faulty investment never blocks the rest of the pass
            match self.settle_investment(&investment, now).await {
                Ok(Some(advance)) => {
                    report.settled += 1;
                    report.credited_cents += advance.amount_cents;
                    if advance.completes {
                        report.completed += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    report.failed += 1;
                    error!(
                        "🔴 accrual for investment {} failed, retrying next cycle: {}",
                        investment.investment_id, e
                    );
                }
            }
        }

        info!(
            "⏱ settlement pass: {}/{} settled, {} completed, {} cents credited, {} failed",
            report.settled, report.scanned, report.completed, report.credited_cents, report.failed
        );

        Ok(report)
    }
}

// Plans one settlement step from persisted state alone. Whole cycles are
// counted from last_accrual_time, so a mid-cycle creation pays nothing for
// the partial cycle before it and a catch-up pass credits every missed
// cycle exactly once.
fn plan_accrual(investment: &Investment, now: i64, config: &LedgerConfig) -> Option<AccrualAdvance> {
    if investment.status != InvestmentStatus::Active {
        return None;
    }

    let cycle_secs = config.settlement_cycle_secs;
    let elapsed = u32::try_from((now - investment.last_accrual_time).max(0) / cycle_secs).ok()?;

    let mut cycles = elapsed;
    let mut completes = false;

    if let AccrualLimit::Horizon(max_cycles) = config.roi_limit {
        let remaining = max_cycles.saturating_sub(investment.accrued_cycles);
        if remaining == 0 {
            // an Active investment past its horizon only gets closed out
            return Some(AccrualAdvance {
                cycles: 0,
                amount_cents: 0,
                completes: true,
                new_last_accrual_time: investment.last_accrual_time,
            });
        }
        if cycles >= remaining {
            cycles = remaining;
            completes = true;
        }
    }

    if cycles == 0 {
        return None;
    }

    let mut amount_cents = rate_of_cents(
        investment.principal_cents,
        investment.daily_rate * Decimal::from(cycles),
    )?;

    if let AccrualLimit::PayoutCap(multiple) = config.roi_limit {
        let cap_cents = rate_of_cents(investment.principal_cents, multiple)?;
        let remaining = cap_cents - investment.total_accrued_cents;
        if remaining <= 0 {
            return Some(AccrualAdvance {
                cycles: 0,
                amount_cents: 0,
                completes: true,
                new_last_accrual_time: investment.last_accrual_time,
            });
        }
        if amount_cents >= remaining {
            amount_cents = remaining;
            completes = true;
        }
    }

    Some(AccrualAdvance {
        cycles,
        amount_cents,
        completes,
        // advanced by whole cycles, never to "now", to keep boundaries aligned
        new_last_accrual_time: investment.last_accrual_time + i64::from(cycles) * cycle_secs,
    })
}
