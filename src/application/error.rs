use thiserror::Error;

use crate::domain::{CardStatus, Cents};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Card '{name}' is {status}; only active cards can be charged")]
    CardNotActive { name: String, status: CardStatus },

    #[error("Invalid amount: {0} cents (amounts must be positive)")]
    InvalidAmount(Cents),

    #[error("Insufficient balance on card '{name}': balance {balance}, requested {requested}")]
    InsufficientBalance {
        name: String,
        balance: Cents,
        requested: Cents,
    },

    #[error("Source and destination must be different cards")]
    SameCard,

    #[error("Card {0} is busy; the operation timed out and can be retried")]
    Contention(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl LedgerError {
    /// Only contention failures are safe to retry; every other kind reflects
    /// a state or input problem that retrying will not fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Contention(_))
    }
}
