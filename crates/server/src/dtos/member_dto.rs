use crate::dtos::wallet_dto::MemberSummaryDto;
use database::member::model::{Member, MemberProfile};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Sync/registration request body; the identity itself is verified upstream
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default, ToSchema)]
pub struct SyncMemberDto {
    #[validate(range(min = 1))]
    pub telegram_id: i64,
    /// Sponsor code from the referral link; required on first contact
    pub sponsor_public_id: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
}

impl SyncMemberDto {
    pub fn profile(&self) -> MemberProfile {
        MemberProfile {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            language_code: self.language_code.clone(),
            is_premium: self.is_premium,
        }
    }
}

/// Member snapshot for the presentation layer
#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct MemberDto {
    pub member_id: String,
    pub public_id: String,
    pub telegram_id: i64,
    pub sponsor_member_id: Option<String>,
    pub registration_complete: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub wallet_address: Option<String>,
    pub created_at: i64,
}

impl From<Member> for MemberDto {
    fn from(member: Member) -> Self {
        Self {
            member_id: member.member_id,
            public_id: member.public_id,
            telegram_id: member.telegram_id,
            sponsor_member_id: member.sponsor_member_id,
            registration_complete: member.registration_complete,
            username: member.username,
            first_name: member.first_name,
            last_name: member.last_name,
            wallet_address: member.wallet_address,
            created_at: member.created_at,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct SyncMemberResponse {
    pub member: MemberDto,
    /// false when the identity was already registered and only re-synced
    pub created: bool,
    pub summary: MemberSummaryDto,
}

#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct ReferralsDto {
    pub count: usize,
    pub referrals: Vec<MemberDto>,
}
