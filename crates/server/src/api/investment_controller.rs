use crate::{
    dtos::investment_dto::{CreateInvestmentDto, InvestmentDto},
    extractors::validation_extractor::ValidationExtractor,
    services::{investment_service::InvestmentServiceTrait, Services},
};
use axum::{
    extract::Path,
    routing::{get, post},
    Extension, Json, Router,
};
use utils::AppResult;

/// Records a confirmed deposit and distributes its commissions
#[utoipa::path(
    post,
    path = "/api/v1/investment",
    tag = "investment",
    request_body = CreateInvestmentDto,
    responses(
        (status = 200, description = "Active investment created", body = InvestmentDto),
        (status = 400, description = "Amount below the minimum deposit"),
        (status = 404, description = "Owner not found")
    )
)]
pub async fn create_investment(
    Extension(services): Extension<Services>,
    ValidationExtractor(req): ValidationExtractor<CreateInvestmentDto>,
) -> AppResult<Json<InvestmentDto>> {
    let investment = services.investment.create_investment(&req.member_id, req.amount).await?;

    Ok(Json(investment.into()))
}

/// Lists a member's investments with their accrual progress
#[utoipa::path(
    get,
    path = "/api/v1/investment/list/{member_id}",
    tag = "investment",
    params(
        ("member_id" = String, Path, description = "Internal member id")
    ),
    responses(
        (status = 200, description = "Investment summaries", body = Vec<InvestmentDto>)
    )
)]
pub async fn list_investments(
    Extension(services): Extension<Services>,
    Path(member_id): Path<String>,
) -> AppResult<Json<Vec<InvestmentDto>>> {
    let investments = services.investment.list_investments(&member_id).await?;

    Ok(Json(investments.into_iter().map(InvestmentDto::from).collect()))
}

pub struct InvestmentController;
impl InvestmentController {
    pub fn app() -> Router {
        Router::new()
            .route("/", post(create_investment))
            .route("/list/:member_id", get(list_investments))
    }
}
