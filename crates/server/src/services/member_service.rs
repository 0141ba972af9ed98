use crate::services::errors::{LedgerError, LedgerResult};
use async_trait::async_trait;
use chrono::Utc;
use database::{
    member::{
        model::{Member, MemberProfile},
        repository::{DynMemberRepository, MemberRepositoryTrait},
    },
    wallet::repository::{DynWalletRepository, WalletRepositoryTrait},
};
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use tracing::info;
use utils::{AppError, LedgerConfig};
use uuid::Uuid;

pub type DynMemberService = Arc<dyn MemberServiceTrait + Send + Sync>;

/// Registration input handed over by the identity layer, already verified
#[derive(Debug, Clone)]
pub struct RegisterMember {
    pub telegram_id: i64,
    pub sponsor_public_id: Option<String>,
    pub profile: MemberProfile,
}

#[derive(Debug, Clone)]
pub struct MemberSync {
    pub member: Member,
    /// false when the identity was already registered and only re-synced
    pub created: bool,
}

#[async_trait]
pub trait MemberServiceTrait {
    async fn register_or_sync(&self, request: RegisterMember) -> LedgerResult<MemberSync>;

    // Seeds the sponsorless root member once; later calls return it as-is.
    async fn ensure_root(&self, telegram_id: i64) -> LedgerResult<Member>;

    async fn get_by_public_id(&self, public_id: &str) -> LedgerResult<Member>;

    async fn get_by_member_id(&self, member_id: &str) -> LedgerResult<Member>;

    async fn sponsor_chain(&self, member_id: &str) -> LedgerResult<Vec<Member>>;

    async fn list_direct_referrals(&self, member_id: &str) -> LedgerResult<Vec<Member>>;
}

#[derive(Clone)]
pub struct MemberService {
    members: DynMemberRepository,
    wallets: DynWalletRepository,
    config: Arc<LedgerConfig>,
}

impl MemberService {
    pub fn new(members: DynMemberRepository, wallets: DynWalletRepository, config: Arc<LedgerConfig>) -> Self {
        Self {
            members,
            wallets,
            config,
        }
    }

    fn draw_token(length: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect::<String>()
            .to_uppercase()
    }

    // Bounded retry: a collision draws again, it is never silently accepted.
    async fn allocate_public_id(&self) -> LedgerResult<String> {
        for _ in 0..self.config.public_id_max_attempts {
            let candidate = Self::draw_token(self.config.public_id_length);
            if !self.members.public_id_exists(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(LedgerError::IdGenerationExhausted(self.config.public_id_max_attempts))
    }

    async fn create_member(
        &self,
        request: &RegisterMember,
        sponsor_member_id: Option<String>,
    ) -> LedgerResult<Member> {
        let public_id = self.allocate_public_id().await?;
        let member = Member::new(
            Uuid::new_v4().to_string(),
            public_id,
            request.telegram_id,
            sponsor_member_id,
            request.profile.clone(),
            Utc::now().timestamp(),
        );

        let member = self.members.create_member(member).await?;
        self.wallets.create_wallet(&member.member_id).await?;

        Ok(member)
    }
}

#[async_trait]
impl MemberServiceTrait for MemberService {
    async fn register_or_sync(&self, request: RegisterMember) -> LedgerResult<MemberSync> {
        if let Some(existing) = self.members.get_by_telegram_id(request.telegram_id).await? {
            if existing.registration_complete {
                self.members.update_profile(&existing.member_id, &request.profile).await?;
                let member = self
                    .members
                    .get_by_member_id(&existing.member_id)
                    .await?
                    .unwrap_or(existing);

                return Ok(MemberSync { member, created: false });
            }
        }

        let sponsor_public_id = request
            .sponsor_public_id
            .clone()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| LedgerError::InvalidSponsor(String::new()))?;

        let sponsor = self
            .members
            .get_by_public_id(&sponsor_public_id)
            .await?
            .filter(|sponsor| sponsor.registration_complete)
            .ok_or_else(|| LedgerError::InvalidSponsor(sponsor_public_id.clone()))?;

        let member = self.create_member(&request, Some(sponsor.member_id.clone())).await?;

        info!(
            "✅ member {} registered under sponsor {}",
            member.member_id, sponsor.member_id
        );

        Ok(MemberSync { member, created: true })
    }

    async fn ensure_root(&self, telegram_id: i64) -> LedgerResult<Member> {
        if let Some(existing) = self.members.get_by_telegram_id(telegram_id).await? {
            return Ok(existing);
        }

        let request = RegisterMember {
            telegram_id,
            sponsor_public_id: None,
            profile: MemberProfile::default(),
        };
        let member = self.create_member(&request, None).await?;

        info!("🌱 root member {} seeded", member.member_id);

        Ok(member)
    }

    async fn get_by_public_id(&self, public_id: &str) -> LedgerResult<Member> {
        self.members
            .get_by_public_id(public_id)
            .await?
            .ok_or_else(|| LedgerError::Storage(AppError::NotFound(format!("Member {} not found.", public_id))))
    }

    async fn get_by_member_id(&self, member_id: &str) -> LedgerResult<Member> {
        self.members
            .get_by_member_id(member_id)
            .await?
            .ok_or_else(|| LedgerError::Storage(AppError::NotFound(format!("Member {} not found.", member_id))))
    }

    async fn sponsor_chain(&self, member_id: &str) -> LedgerResult<Vec<Member>> {
        let chain = self
            .members
            .sponsor_chain(member_id, self.config.max_chain_depth)
            .await?;

        Ok(chain)
    }

    async fn list_direct_referrals(&self, member_id: &str) -> LedgerResult<Vec<Member>> {
        let referrals = self.members.list_direct_referrals(member_id).await?;

        Ok(referrals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::{test_config, MemoryStore};
    use database::member::repository::MemberRepositoryTrait;

    fn service(store: &Arc<MemoryStore>) -> MemberService {
        MemberService::new(store.clone(), store.clone(), test_config())
    }

    fn registration(telegram_id: i64, sponsor: Option<&str>) -> RegisterMember {
        RegisterMember {
            telegram_id,
            sponsor_public_id: sponsor.map(str::to_string),
            profile: MemberProfile::default(),
        }
    }

    #[tokio::test]
    async fn registration_creates_member_and_wallet() {
        let store = MemoryStore::new();
        store.add_member("m-root", "ROOT0001", 1, None);
        let service = service(&store);

        let sync = service
            .register_or_sync(registration(42, Some("ROOT0001")))
            .await
            .unwrap();

        assert!(sync.created);
        assert_eq!(sync.member.telegram_id, 42);
        assert_eq!(sync.member.sponsor_member_id.as_deref(), Some("m-root"));
        assert_eq!(sync.member.public_id.len(), 8);
        assert!(store.wallet(&sync.member.member_id).is_some());
    }

    #[tokio::test]
    async fn unknown_sponsor_creates_nothing() {
        let store = MemoryStore::new();
        let service = service(&store);

        let err = service
            .register_or_sync(registration(42, Some("NOPE")))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidSponsor(code) if code == "NOPE"));
        assert!(store.state.lock().unwrap().members.is_empty());
        assert!(store.state.lock().unwrap().wallets.is_empty());
    }

    #[tokio::test]
    async fn missing_sponsor_code_is_rejected() {
        let store = MemoryStore::new();
        let service = service(&store);

        let err = service.register_or_sync(registration(42, None)).await.unwrap_err();

        assert!(matches!(err, LedgerError::InvalidSponsor(_)));
    }

    #[tokio::test]
    async fn existing_member_is_synced_not_recreated() {
        let store = MemoryStore::new();
        store.add_member("m-root", "ROOT0001", 1, None);
        let service = service(&store);

        let first = service
            .register_or_sync(registration(42, Some("ROOT0001")))
            .await
            .unwrap();

        let mut again = registration(42, None);
        again.profile.username = Some("blaster".to_string());
        let second = service.register_or_sync(again).await.unwrap();

        assert!(!second.created);
        assert_eq!(second.member.member_id, first.member.member_id);
        assert_eq!(second.member.username.as_deref(), Some("blaster"));
    }

    #[tokio::test]
    async fn exhausted_id_space_is_an_explicit_failure() {
        let store = MemoryStore::new();
        store.add_member("m-root", "ROOT0001", 1, None);
        store
            .public_id_always_taken
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let service = service(&store);

        let err = service
            .register_or_sync(registration(42, Some("ROOT0001")))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::IdGenerationExhausted(5)));
    }

    #[tokio::test]
    async fn sponsor_chain_is_depth_bounded() {
        let store = MemoryStore::new();
        store.add_member("m-1", "P1", 1, None);
        store.add_member("m-2", "P2", 2, Some("m-1"));
        store.add_member("m-3", "P3", 3, Some("m-2"));
        store.add_member("m-4", "P4", 4, Some("m-3"));
        store.add_member("m-5", "P5", 5, Some("m-4"));
        let service = service(&store);

        let chain = service.sponsor_chain("m-5").await.unwrap();

        // five generations exist but the walk stops at the configured depth
        let ids: Vec<_> = chain.iter().map(|m| m.member_id.as_str()).collect();
        assert_eq!(ids, vec!["m-4", "m-3", "m-2"]);
    }

    #[tokio::test]
    async fn corrupt_sponsor_loop_still_terminates() {
        let store = MemoryStore::new();
        store.add_member("m-1", "P1", 1, Some("m-2"));
        store.add_member("m-2", "P2", 2, Some("m-1"));

        let chain = store.sponsor_chain("m-1", 10).await.unwrap();

        assert!(chain.len() <= 2);
    }

    #[tokio::test]
    async fn ensure_root_is_idempotent() {
        let store = MemoryStore::new();
        let service = service(&store);

        let first = service.ensure_root(7).await.unwrap();
        let second = service.ensure_root(7).await.unwrap();

        assert_eq!(first.member_id, second.member_id);
        assert_eq!(first.sponsor_member_id, None);
        assert_eq!(store.state.lock().unwrap().members.len(), 1);
    }
}
