use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blast Ledger API",
        description = "Referral-driven investment ledger: sponsor bonuses, level commissions, daily ROI accrual and withdrawals",
        version = "1.0.0",
        contact(
            name = "API Support",
            email = "support@blastledger.io"
        )
    ),
    paths(
        // System health check
        crate::api::health,
        // Member endpoints
        crate::api::member_controller::sync_member,
        crate::api::member_controller::get_member,
        crate::api::member_controller::list_referrals,
        // Investment endpoints
        crate::api::investment_controller::create_investment,
        crate::api::investment_controller::list_investments,
        // Wallet endpoints
        crate::api::wallet_controller::get_summary,
        crate::api::wallet_controller::get_history,
        // Withdrawal endpoints
        crate::api::withdrawal_controller::request_withdrawal,
        crate::api::withdrawal_controller::list_withdrawals,
    ),
    components(schemas(
        crate::dtos::member_dto::SyncMemberDto,
        crate::dtos::member_dto::MemberDto,
        crate::dtos::member_dto::SyncMemberResponse,
        crate::dtos::member_dto::ReferralsDto,
        crate::dtos::investment_dto::CreateInvestmentDto,
        crate::dtos::investment_dto::InvestmentDto,
        crate::dtos::wallet_dto::MemberSummaryDto,
        crate::dtos::wallet_dto::LedgerEntryDto,
        crate::dtos::withdrawal_dto::RequestWithdrawalDto,
        crate::dtos::withdrawal_dto::WithdrawalRequestDto,
        database::investment::model::InvestmentStatus,
        database::ledger::model::LedgerKind,
        database::withdrawal::model::WithdrawalStatus,
    )),
    tags(
        (name = "system", description = "Health and runtime status"),
        (name = "member", description = "Identity and sponsor tree"),
        (name = "investment", description = "Principal deposits and accrual state"),
        (name = "wallet", description = "Balances, income totals and audit trail"),
        (name = "withdrawal", description = "Payout requests")
    )
)]
pub struct ApiDoc;
