use crate::{
    dtos::wallet_dto::{LedgerEntryDto, MemberSummaryDto},
    services::{wallet_service::WalletServiceTrait, Services},
};
use axum::{extract::Path, routing::get, Extension, Json, Router};
use utils::AppResult;

// history page size; older entries stay queryable in storage
const HISTORY_LIMIT: i64 = 100;

/// Balances and income totals for one member
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{member_id}",
    tag = "wallet",
    params(
        ("member_id" = String, Path, description = "Internal member id")
    ),
    responses(
        (status = 200, description = "Wallet summary", body = MemberSummaryDto),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn get_summary(
    Extension(services): Extension<Services>,
    Path(member_id): Path<String>,
) -> AppResult<Json<MemberSummaryDto>> {
    let summary = services.wallet.member_summary(&member_id).await?;

    Ok(Json(summary.into()))
}

/// Recent ledger entries for one member, newest first
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{member_id}/history",
    tag = "wallet",
    params(
        ("member_id" = String, Path, description = "Internal member id")
    ),
    responses(
        (status = 200, description = "Audit trail lines", body = Vec<LedgerEntryDto>)
    )
)]
pub async fn get_history(
    Extension(services): Extension<Services>,
    Path(member_id): Path<String>,
) -> AppResult<Json<Vec<LedgerEntryDto>>> {
    let entries = services.wallet.ledger_history(&member_id, HISTORY_LIMIT).await?;

    Ok(Json(entries.into_iter().map(LedgerEntryDto::from).collect()))
}

pub struct WalletController;
impl WalletController {
    pub fn app() -> Router {
        Router::new()
            .route("/:member_id", get(get_summary))
            .route("/:member_id/history", get(get_history))
    }
}
