use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Member identity and sponsor-tree record
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct Member {
    /// MongoDB document id
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    /// Internal key, immutable once assigned
    pub member_id: String,
    /// External-facing unique token, used in referral links
    pub public_id: String,
    /// Verified telegram identity
    pub telegram_id: i64,
    /// Direct sponsor; None only for the root member
    pub sponsor_member_id: Option<String>,
    pub registration_complete: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    pub is_premium: bool,
    /// Last payout destination used by this member
    pub wallet_address: Option<String>,
    /// Creation timestamp (unix seconds)
    pub created_at: i64,
}

/// Profile fields refreshed on every sync
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MemberProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    pub is_premium: bool,
}

impl Member {
    pub fn new(
        member_id: String,
        public_id: String,
        telegram_id: i64,
        sponsor_member_id: Option<String>,
        profile: MemberProfile,
        now: i64,
    ) -> Self {
        Self {
            id: None,
            member_id,
            public_id,
            telegram_id,
            sponsor_member_id,
            registration_complete: true,
            username: profile.username,
            first_name: profile.first_name,
            last_name: profile.last_name,
            language_code: profile.language_code,
            is_premium: profile.is_premium,
            wallet_address: None,
            created_at: now,
        }
    }
}
