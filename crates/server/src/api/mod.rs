pub mod investment_controller;
pub mod member_controller;
pub mod wallet_controller;
pub mod withdrawal_controller;

use axum::routing::{get, Router};

/// System health check
///
/// Returns the server run status
#[utoipa::path(
    get,
    path = "/api/v1/",
    responses(
        (status = 200, description = "Server is up", body = String)
    ),
    tag = "system"
)]
pub async fn health() -> &'static str {
    "Server is running! 🚀"
}

pub fn app() -> Router {
    Router::new()
        .route("/", get(health))
        .nest("/member", member_controller::MemberController::app())
        .nest("/investment", investment_controller::InvestmentController::app())
        .nest("/wallet", wallet_controller::WalletController::app())
        .nest("/withdrawal", withdrawal_controller::WithdrawalController::app())
}
