use crate::{
    dtos::withdrawal_dto::{RequestWithdrawalDto, WithdrawalRequestDto},
    extractors::validation_extractor::ValidationExtractor,
    services::{withdrawal_service::WithdrawalServiceTrait, Services},
};
use axum::{
    extract::Path,
    routing::{get, post},
    Extension, Json, Router,
};
use utils::AppResult;

/// Debits the withdrawable balance and queues a payout request
#[utoipa::path(
    post,
    path = "/api/v1/withdrawal",
    tag = "withdrawal",
    request_body = RequestWithdrawalDto,
    responses(
        (status = 200, description = "Pending payout request", body = WithdrawalRequestDto),
        (status = 400, description = "Below the minimum or insufficient balance"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn request_withdrawal(
    Extension(services): Extension<Services>,
    ValidationExtractor(req): ValidationExtractor<RequestWithdrawalDto>,
) -> AppResult<Json<WithdrawalRequestDto>> {
    let request = services
        .withdrawal
        .request_withdrawal(&req.member_id, req.amount, &req.destination_address)
        .await?;

    Ok(Json(request.into()))
}

/// Lists a member's withdrawal requests, newest first
#[utoipa::path(
    get,
    path = "/api/v1/withdrawal/list/{member_id}",
    tag = "withdrawal",
    params(
        ("member_id" = String, Path, description = "Internal member id")
    ),
    responses(
        (status = 200, description = "Withdrawal history", body = Vec<WithdrawalRequestDto>)
    )
)]
pub async fn list_withdrawals(
    Extension(services): Extension<Services>,
    Path(member_id): Path<String>,
) -> AppResult<Json<Vec<WithdrawalRequestDto>>> {
    let requests = services.withdrawal.list_withdrawals(&member_id).await?;

    Ok(Json(requests.into_iter().map(WithdrawalRequestDto::from).collect()))
}

pub struct WithdrawalController;
impl WithdrawalController {
    pub fn app() -> Router {
        Router::new()
            .route("/", post(request_withdrawal))
            .route("/list/:member_id", get(list_withdrawals))
    }
}
