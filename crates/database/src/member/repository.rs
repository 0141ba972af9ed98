use crate::{
    member::model::{Member, MemberProfile},
    Database,
};
use async_trait::async_trait;
use mongodb::{bson::doc, options::FindOptions};
use std::{collections::HashSet, sync::Arc};
use tokio_stream::StreamExt;
use utils::{AppError, AppResult};

pub type DynMemberRepository = Arc<dyn MemberRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait MemberRepositoryTrait {
    async fn create_member(&self, member: Member) -> AppResult<Member>;

    async fn get_by_member_id(&self, member_id: &str) -> AppResult<Option<Member>>;

    async fn get_by_public_id(&self, public_id: &str) -> AppResult<Option<Member>>;

    async fn get_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<Member>>;

    async fn public_id_exists(&self, public_id: &str) -> AppResult<bool>;

    async fn update_profile(&self, member_id: &str, profile: &MemberProfile) -> AppResult<()>;

    async fn set_wallet_address(&self, member_id: &str, address: &str) -> AppResult<()>;

    // Walks sponsor links upward: direct sponsor first, at most max_depth hops.
    async fn sponsor_chain(&self, member_id: &str, max_depth: usize) -> AppResult<Vec<Member>>;

    async fn list_direct_referrals(&self, member_id: &str) -> AppResult<Vec<Member>>;
}

#[async_trait]
impl MemberRepositoryTrait for Database {
    async fn create_member(&self, member: Member) -> AppResult<Member> {
        let existing = self
            .members
            .find_one(doc! { "telegram_id": member.telegram_id }, None)
            .await?;

        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "Member with telegram id {} already exists.",
                member.telegram_id
            )));
        }

        self.members.insert_one(&member, None).await?;

        Ok(member)
    }

    async fn get_by_member_id(&self, member_id: &str) -> AppResult<Option<Member>> {
        let filter = doc! { "member_id": member_id };
        let member = self.members.find_one(filter, None).await?;

        Ok(member)
    }

    async fn get_by_public_id(&self, public_id: &str) -> AppResult<Option<Member>> {
        let filter = doc! { "public_id": public_id };
        let member = self.members.find_one(filter, None).await?;

        Ok(member)
    }

    async fn get_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<Member>> {
        let filter = doc! { "telegram_id": telegram_id };
        let member = self.members.find_one(filter, None).await?;

        Ok(member)
    }

    async fn public_id_exists(&self, public_id: &str) -> AppResult<bool> {
        let count = self
            .members
            .count_documents(doc! { "public_id": public_id }, None)
            .await?;

        Ok(count > 0)
    }

    async fn update_profile(&self, member_id: &str, profile: &MemberProfile) -> AppResult<()> {
        let update = doc! {
            "$set": {
                "username": profile.username.clone(),
                "first_name": profile.first_name.clone(),
                "last_name": profile.last_name.clone(),
                "language_code": profile.language_code.clone(),
                "is_premium": profile.is_premium,
            },
        };

        let updated = self
            .members
            .update_one(doc! { "member_id": member_id }, update, None)
            .await?;

        if updated.matched_count == 0 {
            return Err(AppError::NotFound(format!("Member {} not found.", member_id)));
        }

        Ok(())
    }

    async fn set_wallet_address(&self, member_id: &str, address: &str) -> AppResult<()> {
        let updated = self
            .members
            .update_one(
                doc! { "member_id": member_id },
                doc! { "$set": { "wallet_address": address } },
                None,
            )
            .await?;

        if updated.matched_count == 0 {
            return Err(AppError::NotFound(format!("Member {} not found.", member_id)));
        }

        Ok(())
    }

    async fn sponsor_chain(&self, member_id: &str, max_depth: usize) -> AppResult<Vec<Member>> {
        let mut chain = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(member_id.to_string());

        let Some(start) = self.get_by_member_id(member_id).await? else {
            return Ok(chain);
        };

        let mut next = start.sponsor_member_id;
        while chain.len() < max_depth {
            let Some(sponsor_id) = next else { break };
            // the visited set keeps even corrupt data from looping the walk
            if !visited.insert(sponsor_id.clone()) {
                break;
            }
            let Some(sponsor) = self.get_by_member_id(&sponsor_id).await? else {
                break;
            };
            next = sponsor.sponsor_member_id.clone();
            chain.push(sponsor);
        }

        Ok(chain)
    }

    async fn list_direct_referrals(&self, member_id: &str) -> AppResult<Vec<Member>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let mut cursor = self
            .members
            .find(doc! { "sponsor_member_id": member_id }, options)
            .await?;

        let mut referrals = Vec::new();
        while let Some(member) = cursor.try_next().await? {
            referrals.push(member);
        }

        Ok(referrals)
    }
}
