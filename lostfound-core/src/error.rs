use thiserror::Error;

use crate::claim::ClaimStatus;
use crate::item::ItemStatus;
use crate::media::MediaKind;
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),

    #[error("Please provide at least one proof image or video")]
    ProofRequired,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Item is already {0} and cannot be claimed")]
    ItemUnavailable(ItemStatus),

    #[error("You already have a pending claim for this item")]
    DuplicateClaim,

    #[error("Claim is already {0}")]
    AlreadyInStatus(ClaimStatus),

    #[error("Cannot transition claim from {from} to {to}")]
    InvalidTransition { from: ClaimStatus, to: ClaimStatus },

    #[error("Claim status changed concurrently (now {0}), please retry")]
    StaleClaim(ClaimStatus),

    #[error("{kind} upload failed: {reason}")]
    Upload { kind: MediaKind, reason: String },

    #[error("Storage error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Caller-facing category of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthenticated,
    Forbidden,
    Conflict,
    UploadFailure,
    Internal,
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::ProofRequired => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::ItemUnavailable(_)
            | Self::DuplicateClaim
            | Self::AlreadyInStatus(_)
            | Self::InvalidTransition { .. }
            | Self::StaleClaim(_) => ErrorKind::Conflict,
            Self::Upload { .. } => ErrorKind::UploadFailure,
            Self::Store(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicatePending => Self::DuplicateClaim,
            StoreError::ItemUnavailable(status) => Self::ItemUnavailable(status),
            StoreError::ItemMissing(_) => Self::NotFound("Associated item not found".to_string()),
            StoreError::StaleStatus(status) => Self::StaleClaim(status),
            StoreError::EmailTaken => {
                Self::Validation("Email is already linked to another account".to_string())
            }
            other => Self::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
