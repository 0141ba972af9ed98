use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Paid,
    Rejected,
}

/// Payout request emitted after a successful balance debit; execution is
/// handled by an external collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct WithdrawalRequest {
    /// MongoDB document id
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub request_id: String,
    pub member_id: String,
    pub amount_cents: i64,
    pub destination_address: String,
    pub status: WithdrawalStatus,
    /// Creation timestamp (unix seconds)
    pub created_at: i64,
}

impl WithdrawalRequest {
    pub fn pending(request_id: String, member_id: &str, amount_cents: i64, destination_address: &str, now: i64) -> Self {
        Self {
            id: None,
            request_id,
            member_id: member_id.to_string(),
            amount_cents,
            destination_address: destination_address.to_string(),
            status: WithdrawalStatus::Pending,
            created_at: now,
        }
    }
}
