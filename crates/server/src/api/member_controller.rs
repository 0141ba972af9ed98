use crate::{
    dtos::member_dto::{MemberDto, ReferralsDto, SyncMemberDto, SyncMemberResponse},
    extractors::validation_extractor::ValidationExtractor,
    services::{
        member_service::{MemberServiceTrait, RegisterMember},
        wallet_service::WalletServiceTrait,
        Services,
    },
};
use axum::{
    extract::Path,
    routing::{get, post},
    Extension, Json, Router,
};
use utils::AppResult;

/// Registers a new member or re-syncs an existing identity
#[utoipa::path(
    post,
    path = "/api/v1/member/sync",
    tag = "member",
    request_body = SyncMemberDto,
    responses(
        (status = 200, description = "Member snapshot with dashboard summary", body = SyncMemberResponse),
        (status = 400, description = "Sponsor code missing or invalid"),
        (status = 409, description = "Public id space exhausted")
    )
)]
pub async fn sync_member(
    Extension(services): Extension<Services>,
    ValidationExtractor(req): ValidationExtractor<SyncMemberDto>,
) -> AppResult<Json<SyncMemberResponse>> {
    let request = RegisterMember {
        telegram_id: req.telegram_id,
        sponsor_public_id: req.sponsor_public_id.clone(),
        profile: req.profile(),
    };
    let sync = services.member.register_or_sync(request).await?;
    let summary = services.wallet.member_summary(&sync.member.member_id).await?;

    Ok(Json(SyncMemberResponse {
        member: sync.member.into(),
        created: sync.created,
        summary: summary.into(),
    }))
}

/// Looks a member up by public id
#[utoipa::path(
    get,
    path = "/api/v1/member/{public_id}",
    tag = "member",
    params(
        ("public_id" = String, Path, description = "External member token")
    ),
    responses(
        (status = 200, description = "Member snapshot", body = MemberDto),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member(
    Extension(services): Extension<Services>,
    Path(public_id): Path<String>,
) -> AppResult<Json<MemberDto>> {
    let member = services.member.get_by_public_id(&public_id).await?;

    Ok(Json(member.into()))
}

/// Lists a member's direct referrals, newest first
#[utoipa::path(
    get,
    path = "/api/v1/member/{member_id}/referrals",
    tag = "member",
    params(
        ("member_id" = String, Path, description = "Internal member id")
    ),
    responses(
        (status = 200, description = "Direct downline", body = ReferralsDto)
    )
)]
pub async fn list_referrals(
    Extension(services): Extension<Services>,
    Path(member_id): Path<String>,
) -> AppResult<Json<ReferralsDto>> {
    let referrals = services.member.list_direct_referrals(&member_id).await?;

    Ok(Json(ReferralsDto {
        count: referrals.len(),
        referrals: referrals.into_iter().map(MemberDto::from).collect(),
    }))
}

pub struct MemberController;
impl MemberController {
    pub fn app() -> Router {
        Router::new()
            .route("/sync", post(sync_member))
            .route("/:public_id", get(get_member))
            .route("/:member_id/referrals", get(list_referrals))
    }
}
