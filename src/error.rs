use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced by ledger operations.
///
/// Validation errors are detected before any row is written; store errors
/// always roll back the enclosing transaction, so the balance invariants
/// hold whenever an operation returns.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no client named {0:?}")]
    UnknownClient(String),
    #[error("client not found: {0}")]
    ClientNotFound(i64),
    #[error("credit not found: {0}")]
    CreditNotFound(i64),
    #[error("payment not found: {0}")]
    PaymentNotFound(i64),

    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),
    #[error("payment of {amount} exceeds remaining balance of {remaining}")]
    Overpayment { amount: Decimal, remaining: Decimal },
    #[error("principal {principal} is below the {paid} already collected")]
    BelowPaid { principal: Decimal, paid: Decimal },
    #[error("credit {0} is already settled")]
    AlreadySettled(i64),
    #[error("field {0:?} cannot be edited")]
    ImmutableField(&'static str),
    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl LedgerError {
    /// Stable error code, for facades that map errors onto a wire format.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownClient(_)
            | Self::ClientNotFound(_)
            | Self::CreditNotFound(_)
            | Self::PaymentNotFound(_) => "NOT_FOUND",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::BelowPaid { .. } => "BELOW_PAID",
            Self::AlreadySettled(_) => "ALREADY_SETTLED",
            Self::ImmutableField(_) => "IMMUTABLE_FIELD",
            Self::Validation(_) => "VALIDATION",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// True when the underlying store reported a transient busy/locked
    /// conflict. Retry is the caller's decision; the engine never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Store(rusqlite::Error::SqliteFailure(e, _))
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                )
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
