use std::collections::BTreeMap;
use thiserror::Error;

/// Field-keyed validation messages, surfaced as a 422 body.
pub type ValidationErrors = BTreeMap<&'static str, Vec<String>>;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Validation failed")]
    Validation(ValidationErrors),

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Insufficient asset")]
    InsufficientAsset,

    #[error("Asset not found")]
    AssetNotFound,

    #[error("Order cannot be cancelled")]
    CannotCancel,

    #[error("Order not found")]
    NotFound,

    /// Deadlock / serialization retries exhausted.
    #[error("Order book is busy, please retry")]
    StoreConflict,

    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),
}
