use database::withdrawal::model::{WithdrawalRequest, WithdrawalStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utils::from_cents;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default, ToSchema)]
pub struct RequestWithdrawalDto {
    #[validate(length(min = 1))]
    pub member_id: String,
    pub amount: Decimal,
    /// Receiving address handed to the payout collaborator
    #[validate(length(min = 4))]
    pub destination_address: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct WithdrawalRequestDto {
    pub request_id: String,
    pub member_id: String,
    pub amount: Decimal,
    pub destination_address: String,
    pub status: WithdrawalStatus,
    pub created_at: i64,
}

impl From<WithdrawalRequest> for WithdrawalRequestDto {
    fn from(request: WithdrawalRequest) -> Self {
        Self {
            request_id: request.request_id,
            member_id: request.member_id,
            amount: from_cents(request.amount_cents),
            destination_address: request.destination_address,
            status: request.status,
            created_at: request.created_at,
        }
    }
}
