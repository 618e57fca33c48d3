//! The module contains the errors the engine can return.
//!
//! Business-rule failures ([`InsufficientFunds`], [`AlreadyResolved`], limit
//! violations, ...) are expected outcomes and are returned to the caller as
//! values. Only [`Database`] represents an infrastructure fault; when it is
//! raised the surrounding unit of work has already been rolled back in full.
//!
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`AlreadyResolved`]: EngineError::AlreadyResolved
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" not found!")]
    KeyNotFound(String),
    #[error("Already resolved: {0}")]
    AlreadyResolved(String),
    #[error("Expired: {0}")]
    Expired(String),
    #[error("A loan is already active: {0}")]
    LoanAlreadyActive(String),
    #[error("Loan limit exceeded: {0}")]
    LoanLimitExceeded(String),
    #[error("Listing limit exceeded: {0}")]
    ListingLimitExceeded(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::AlreadyResolved(a), Self::AlreadyResolved(b)) => a == b,
            (Self::Expired(a), Self::Expired(b)) => a == b,
            (Self::LoanAlreadyActive(a), Self::LoanAlreadyActive(b)) => a == b,
            (Self::LoanLimitExceeded(a), Self::LoanLimitExceeded(b)) => a == b,
            (Self::ListingLimitExceeded(a), Self::ListingLimitExceeded(b)) => a == b,
            (Self::PermissionDenied(a), Self::PermissionDenied(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
