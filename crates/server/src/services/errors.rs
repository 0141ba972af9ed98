use rust_decimal::Decimal;
use utils::AppError;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Failure taxonomy of the ledger core. Validation variants report and
/// change nothing; Storage wraps operational faults from the layers below,
/// which callers may retry safely thanks to the ledger idempotency keys.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("sponsor code {0:?} does not resolve to a registered member")]
    InvalidSponsor(String),

    #[error("could not allocate a unique public id after {0} attempts")]
    IdGenerationExhausted(u32),

    #[error("amount {amount} is below the minimum of {minimum}")]
    BelowMinimum { amount: Decimal, minimum: Decimal },

    #[error("requested {requested} exceeds the withdrawable balance of {available}")]
    InsufficientBalance { requested: Decimal, available: Decimal },

    #[error("investment {0} has already been processed")]
    InvestmentAlreadyProcessed(String),

    #[error("member {0} not found")]
    OwnerNotFound(String),

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidSponsor(_)
            | LedgerError::BelowMinimum { .. }
            | LedgerError::InsufficientBalance { .. } => AppError::BadRequest(err.to_string()),
            LedgerError::InvestmentAlreadyProcessed(_) | LedgerError::IdGenerationExhausted(_) => {
                AppError::Conflict(err.to_string())
            }
            LedgerError::OwnerNotFound(_) => AppError::NotFound(err.to_string()),
            LedgerError::Storage(inner) => inner,
        }
    }
}
