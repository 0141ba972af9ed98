//! In-memory doubles for the repository traits. They reproduce the storage
//! guarantees the services lean on (dedup-key uniqueness, guarded debits,
//! CAS on the accrued cycle count) behind a single mutex, so the money
//! movement properties can be exercised without a live mongod.

use async_trait::async_trait;
use database::{
    investment::{
        model::{Investment, InvestmentStatus},
        repository::{AccrualAdvance, AccrualOutcome, InvestmentRepositoryTrait},
    },
    ledger::{
        model::{LedgerEntry, LedgerKind},
        repository::{CreditOutcome, IncomeTotals, LedgerRepositoryTrait},
    },
    member::{
        model::{Member, MemberProfile},
        repository::MemberRepositoryTrait,
    },
    wallet::{
        model::{WalletAccount, WalletKind},
        repository::WalletRepositoryTrait,
    },
    withdrawal::{model::WithdrawalRequest, repository::WithdrawalRepositoryTrait},
};
use rust_decimal::Decimal;
use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
    sync::{atomic::AtomicBool, atomic::Ordering, Arc, Mutex},
};
use utils::{AppConfig, AppError, AppResult, LedgerConfig};

pub fn test_config() -> Arc<LedgerConfig> {
    Arc::new(LedgerConfig::from_app_config(&AppConfig::new_for_test()).unwrap())
}

#[derive(Default)]
pub struct MemoryState {
    pub members: HashMap<String, Member>,
    pub wallets: HashMap<String, WalletAccount>,
    pub investments: HashMap<String, Investment>,
    pub entries: Vec<LedgerEntry>,
    pub dedup: HashSet<String>,
    pub withdrawals: Vec<WithdrawalRequest>,
}

#[derive(Default)]
pub struct MemoryStore {
    pub state: Mutex<MemoryState>,
    /// Forces every public id probe to report a collision
    pub public_id_always_taken: AtomicBool,
    /// Member ids whose wallet writes fail with an injected storage error
    pub fail_wallet_writes: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_member(self: &Arc<Self>, member_id: &str, public_id: &str, telegram_id: i64, sponsor: Option<&str>) -> Member {
        let member = Member::new(
            member_id.to_string(),
            public_id.to_string(),
            telegram_id,
            sponsor.map(str::to_string),
            MemberProfile::default(),
            0,
        );
        let mut state = self.state.lock().unwrap();
        state.members.insert(member_id.to_string(), member.clone());
        state
            .wallets
            .insert(member_id.to_string(), WalletAccount::zero(member_id, 0));
        member
    }

    pub fn add_investment(self: &Arc<Self>, investment_id: &str, owner: &str, principal_cents: i64) -> Investment {
        self.add_investment_at(investment_id, owner, principal_cents, 0)
    }

    pub fn add_investment_at(
        self: &Arc<Self>,
        investment_id: &str,
        owner: &str,
        principal_cents: i64,
        start_time: i64,
    ) -> Investment {
        let investment = Investment::new(
            investment_id.to_string(),
            owner,
            principal_cents,
            Decimal::from_str("0.02").unwrap(),
            start_time,
        );
        self.state
            .lock()
            .unwrap()
            .investments
            .insert(investment_id.to_string(), investment.clone());
        investment
    }

    pub fn replace_investment(self: &Arc<Self>, investment: Investment) {
        self.state
            .lock()
            .unwrap()
            .investments
            .insert(investment.investment_id.clone(), investment);
    }

    pub fn investment(&self, investment_id: &str) -> Option<Investment> {
        self.state.lock().unwrap().investments.get(investment_id).cloned()
    }

    pub fn wallet(&self, member_id: &str) -> Option<WalletAccount> {
        self.state.lock().unwrap().wallets.get(member_id).cloned()
    }

    pub fn set_wallet(&self, member_id: &str, mutate: impl FnOnce(&mut WalletAccount)) {
        let mut state = self.state.lock().unwrap();
        let wallet = state.wallets.get_mut(member_id).expect("wallet not seeded");
        mutate(wallet);
    }

    /// Seeds an already-applied credit, as a crashed distribution would leave it
    pub fn record_entry(&self, entry: LedgerEntry, wallet: WalletKind) {
        let mut state = self.state.lock().unwrap();
        assert!(state.dedup.insert(entry.dedup_key.clone()), "entry already recorded");
        {
            let account = state.wallets.get_mut(&entry.member_id).expect("wallet not seeded");
            match wallet {
                WalletKind::Fund => account.fund_wallet_cents += entry.amount_cents,
                WalletKind::Income => account.income_wallet_cents += entry.amount_cents,
                WalletKind::Referral => account.referral_wallet_cents += entry.amount_cents,
            }
        }
        state.entries.push(entry);
    }

    fn wallet_write_fails(&self, member_id: &str) -> bool {
        self.fail_wallet_writes.lock().unwrap().contains(member_id)
    }
}

#[async_trait]
impl MemberRepositoryTrait for MemoryStore {
    async fn create_member(&self, member: Member) -> AppResult<Member> {
        let mut state = self.state.lock().unwrap();
        if state.members.values().any(|m| m.telegram_id == member.telegram_id) {
            return Err(AppError::Conflict(format!(
                "Member with telegram id {} already exists.",
                member.telegram_id
            )));
        }
        state.members.insert(member.member_id.clone(), member.clone());
        Ok(member)
    }

    async fn get_by_member_id(&self, member_id: &str) -> AppResult<Option<Member>> {
        Ok(self.state.lock().unwrap().members.get(member_id).cloned())
    }

    async fn get_by_public_id(&self, public_id: &str) -> AppResult<Option<Member>> {
        let state = self.state.lock().unwrap();
        Ok(state.members.values().find(|m| m.public_id == public_id).cloned())
    }

    async fn get_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<Member>> {
        let state = self.state.lock().unwrap();
        Ok(state.members.values().find(|m| m.telegram_id == telegram_id).cloned())
    }

    async fn public_id_exists(&self, public_id: &str) -> AppResult<bool> {
        if self.public_id_always_taken.load(Ordering::SeqCst) {
            return Ok(true);
        }
        let state = self.state.lock().unwrap();
        Ok(state.members.values().any(|m| m.public_id == public_id))
    }

    async fn update_profile(&self, member_id: &str, profile: &MemberProfile) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let member = state
            .members
            .get_mut(member_id)
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found.", member_id)))?;
        member.username = profile.username.clone();
        member.first_name = profile.first_name.clone();
        member.last_name = profile.last_name.clone();
        member.language_code = profile.language_code.clone();
        member.is_premium = profile.is_premium;
        Ok(())
    }

    async fn set_wallet_address(&self, member_id: &str, address: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let member = state
            .members
            .get_mut(member_id)
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found.", member_id)))?;
        member.wallet_address = Some(address.to_string());
        Ok(())
    }

    async fn sponsor_chain(&self, member_id: &str, max_depth: usize) -> AppResult<Vec<Member>> {
        let state = self.state.lock().unwrap();
        let mut chain = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(member_id.to_string());

        let Some(start) = state.members.get(member_id) else {
            return Ok(chain);
        };
        let mut next = start.sponsor_member_id.clone();
        while chain.len() < max_depth {
            let Some(sponsor_id) = next else { break };
            if !visited.insert(sponsor_id.clone()) {
                break;
            }
            let Some(sponsor) = state.members.get(&sponsor_id) else {
                break;
            };
            next = sponsor.sponsor_member_id.clone();
            chain.push(sponsor.clone());
        }
        Ok(chain)
    }

    async fn list_direct_referrals(&self, member_id: &str) -> AppResult<Vec<Member>> {
        let state = self.state.lock().unwrap();
        let mut referrals: Vec<Member> = state
            .members
            .values()
            .filter(|m| m.sponsor_member_id.as_deref() == Some(member_id))
            .cloned()
            .collect();
        referrals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(referrals)
    }
}

#[async_trait]
impl WalletRepositoryTrait for MemoryStore {
    async fn create_wallet(&self, member_id: &str) -> AppResult<WalletAccount> {
        let mut state = self.state.lock().unwrap();
        if state.wallets.contains_key(member_id) {
            return Err(AppError::Conflict(format!("Wallet for member {} already exists.", member_id)));
        }
        let wallet = WalletAccount::zero(member_id, 0);
        state.wallets.insert(member_id.to_string(), wallet.clone());
        Ok(wallet)
    }

    async fn get_wallet(&self, member_id: &str) -> AppResult<Option<WalletAccount>> {
        Ok(self.state.lock().unwrap().wallets.get(member_id).cloned())
    }

    async fn credit(&self, member_id: &str, kind: WalletKind, amount_cents: i64) -> AppResult<()> {
        if amount_cents <= 0 {
            return Err(AppError::BadRequest(format!(
                "Wallet credit must be positive, got {}.",
                amount_cents
            )));
        }
        if self.wallet_write_fails(member_id) {
            return Err(AppError::BadRequest("injected wallet write failure".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let wallet = state
            .wallets
            .get_mut(member_id)
            .ok_or_else(|| AppError::NotFound(format!("Wallet for member {} not found.", member_id)))?;
        match kind {
            WalletKind::Fund => wallet.fund_wallet_cents += amount_cents,
            WalletKind::Income => wallet.income_wallet_cents += amount_cents,
            WalletKind::Referral => wallet.referral_wallet_cents += amount_cents,
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerRepositoryTrait for MemoryStore {
    async fn apply_credit(&self, entry: LedgerEntry, wallet: WalletKind) -> AppResult<CreditOutcome> {
        if self.wallet_write_fails(&entry.member_id) {
            return Err(AppError::BadRequest("injected wallet write failure".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        if state.dedup.contains(&entry.dedup_key) {
            return Ok(CreditOutcome::AlreadyRecorded);
        }
        {
            let account = state
                .wallets
                .get_mut(&entry.member_id)
                .ok_or_else(|| AppError::NotFound(format!("Wallet for member {} not found.", entry.member_id)))?;
            match wallet {
                WalletKind::Fund => account.fund_wallet_cents += entry.amount_cents,
                WalletKind::Income => account.income_wallet_cents += entry.amount_cents,
                WalletKind::Referral => account.referral_wallet_cents += entry.amount_cents,
            }
        }
        state.dedup.insert(entry.dedup_key.clone());
        state.entries.push(entry);
        Ok(CreditOutcome::Applied)
    }

    async fn list_by_member(&self, member_id: &str, limit: i64) -> AppResult<Vec<LedgerEntry>> {
        let state = self.state.lock().unwrap();
        let mut entries: Vec<LedgerEntry> = state
            .entries
            .iter()
            .filter(|e| e.member_id == member_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit as usize);
        Ok(entries)
    }

    async fn income_totals(&self, member_id: &str) -> AppResult<IncomeTotals> {
        let state = self.state.lock().unwrap();
        let mut totals = IncomeTotals::default();
        for entry in state.entries.iter().filter(|e| e.member_id == member_id) {
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

#[async_trait]
impl InvestmentRepositoryTrait for MemoryStore {
    async fn create_investment(&self, investment: Investment) -> AppResult<Investment> {
        if investment.principal_cents <= 0 {
            return Err(AppError::BadRequest(format!(
                "Investment principal must be positive, got {}.",
                investment.principal_cents
            )));
        }
        self.state
            .lock()
            .unwrap()
            .investments
            .insert(investment.investment_id.clone(), investment.clone());
        Ok(investment)
    }

    async fn get_investment(&self, investment_id: &str) -> AppResult<Option<Investment>> {
        Ok(self.state.lock().unwrap().investments.get(investment_id).cloned())
    }

    async fn list_by_owner(&self, member_id: &str) -> AppResult<Vec<Investment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .investments
            .values()
            .filter(|i| i.owner_member_id == member_id)
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> AppResult<Vec<Investment>> {
        let state = self.state.lock().unwrap();
        let mut active: Vec<Investment> = state
            .investments
            .values()
            .filter(|i| i.status == InvestmentStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.investment_id.cmp(&b.investment_id));
        Ok(active)
    }

    async fn total_active_principal_cents(&self, member_id: &str) -> AppResult<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .investments
            .values()
            .filter(|i| i.owner_member_id == member_id && i.status == InvestmentStatus::Active)
            .map(|i| i.principal_cents)
            .sum())
    }

    async fn apply_accrual(
        &self,
        investment: &Investment,
        advance: &AccrualAdvance,
        entry: Option<LedgerEntry>,
    ) -> AppResult<AccrualOutcome> {
        if self.wallet_write_fails(&investment.owner_member_id) {
            return Err(AppError::BadRequest("injected wallet write failure".to_string()));
        }
        let mut state = self.state.lock().unwrap();

        if let Some(entry) = &entry {
            if state.dedup.contains(&entry.dedup_key) {
                return Ok(AccrualOutcome::AlreadyRecorded);
            }
        }

        {
            let stored = state
                .investments
                .get_mut(&investment.investment_id)
                .ok_or_else(|| AppError::NotFound(format!("Investment {} not found.", investment.investment_id)))?;
            if stored.accrued_cycles != investment.accrued_cycles {
                return Ok(AccrualOutcome::Stale);
            }
            stored.last_accrual_time = advance.new_last_accrual_time;
            stored.accrued_cycles += advance.cycles;
            stored.total_accrued_cents += advance.amount_cents;
            if advance.completes {
                stored.status = InvestmentStatus::Completed;
            }
        }

        if advance.amount_cents > 0 {
            {
                let account = state
                    .wallets
                    .get_mut(&investment.owner_member_id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Wallet for member {} not found.", investment.owner_member_id))
                    })?;
                account.income_wallet_cents += advance.amount_cents;
            }
            if let Some(entry) = entry {
                state.dedup.insert(entry.dedup_key.clone());
                state.entries.push(entry);
            }
        }

        Ok(AccrualOutcome::Applied)
    }
}

#[async_trait]
impl WithdrawalRepositoryTrait for MemoryStore {
    async fn execute_withdrawal(
        &self,
        member_id: &str,
        referral_debit_cents: i64,
        income_debit_cents: i64,
        entry: LedgerEntry,
        request: WithdrawalRequest,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();

        if state.dedup.contains(&entry.dedup_key) {
            return Ok(true);
        }

        {
            let wallet = state
                .wallets
                .get_mut(member_id)
                .ok_or_else(|| AppError::NotFound(format!("Wallet for member {} not found.", member_id)))?;
            if wallet.referral_wallet_cents < referral_debit_cents || wallet.income_wallet_cents < income_debit_cents {
                return Ok(false);
            }
            wallet.referral_wallet_cents -= referral_debit_cents;
            wallet.income_wallet_cents -= income_debit_cents;
        }

        state.dedup.insert(entry.dedup_key.clone());
        state.entries.push(entry);
        state.withdrawals.push(request);
        Ok(true)
    }

    async fn list_by_member(&self, member_id: &str) -> AppResult<Vec<WithdrawalRequest>> {
        let state = self.state.lock().unwrap();
        let mut requests: Vec<WithdrawalRequest> = state
            .withdrawals
            .iter()
            .filter(|r| r.member_id == member_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }
}
