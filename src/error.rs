//! Error types for papertrade

use thiserror::Error;

use crate::types::{Cash, Shares};

/// Main error type for papertrade
#[derive(Error, Debug)]
pub enum PapertradeError {
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Cash, available: Cash },

    #[error("Insufficient shares of {ticker}: requested {requested}, held {held}")]
    InsufficientShares {
        ticker: String,
        requested: Shares,
        held: Shares,
    },

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Trading account is stopped")]
    EngineStopped,
}

/// Result type alias for papertrade operations
pub type Result<T> = std::result::Result<T, PapertradeError>;
