////////////////////////////////////////////////////////////////////////
//
// 1. Each domain gets one service over its repositories
// 2. Services hold trait objects, so the ledger core can be exercised
//    against in-memory doubles as well as the real Database
//
//////////////////////////////////////////////////////////////////////

pub mod accrual_service;
pub mod commission_service;
pub mod errors;
pub mod investment_service;
pub mod member_service;
pub mod wallet_service;
pub mod withdrawal_service;

#[cfg(test)]
pub(crate) mod test_fixtures;

use accrual_service::{AccrualService, DynAccrualService};
use commission_service::CommissionService;
use database::Database;
use investment_service::{DynInvestmentService, InvestmentService};
use member_service::{DynMemberService, MemberService};
use std::sync::Arc;
use tracing::info;
use utils::LedgerConfig;
use wallet_service::{DynWalletService, WalletService};
use withdrawal_service::{DynWithdrawalService, WithdrawalService};

pub use errors::{LedgerError, LedgerResult};

#[derive(Clone)]
pub struct Services {
    pub member: DynMemberService,
    pub investment: DynInvestmentService,
    pub commission: Arc<CommissionService>,
    pub accrual: DynAccrualService,
    pub wallet: DynWalletService,
    pub withdrawal: DynWithdrawalService,
    pub database: Arc<Database>,
    pub config: Arc<LedgerConfig>,
}

impl Services {
    pub fn new(db: Database, config: Arc<LedgerConfig>) -> Self {
        let database = Arc::new(db);

        let member = Arc::new(MemberService::new(database.clone(), database.clone(), config.clone())) as DynMemberService;
        let commission = Arc::new(CommissionService::new(
            database.clone(),
            database.clone(),
            database.clone(),
            config.clone(),
        ));
        let investment = Arc::new(InvestmentService::new(
            database.clone(),
            database.clone(),
            database.clone(),
            commission.clone(),
            config.clone(),
        )) as DynInvestmentService;
        let accrual = Arc::new(AccrualService::new(database.clone(), config.clone())) as DynAccrualService;
        let wallet = Arc::new(WalletService::new(
            database.clone(),
            database.clone(),
            database.clone(),
            config.clone(),
        )) as DynWalletService;
        let withdrawal = Arc::new(WithdrawalService::new(
            database.clone(),
            database.clone(),
            database.clone(),
            config.clone(),
        )) as DynWithdrawalService;

        info!("🧠 services initialized");

        Self {
            member,
            investment,
            commission,
            accrual,
            wallet,
            withdrawal,
            database,
            config,
        }
    }

    /// Creates the indexes the idempotency scheme depends on.
    pub async fn init_storage(&self) -> utils::AppResult<()> {
        self.database.init_indexes().await?;

        Ok(())
    }
}
