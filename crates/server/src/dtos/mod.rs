pub mod investment_dto;
pub mod member_dto;
pub mod wallet_dto;
pub mod withdrawal_dto;
