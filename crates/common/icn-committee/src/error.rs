use crate::credential::ProofError;
use crate::crypto::CryptoError;
use crate::storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a failed operation, relayed to callers with the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authorization,
    NotFound,
    Conflict,
    State,
    Crypto,
    Storage,
}

/// Errors returned by committee operations
#[derive(Error, Debug)]
pub enum CommitteeError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("contract has not been initialized")]
    NotInitialized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid state: {0}")]
    State(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("credential issuance failed: {0}")]
    Issuance(#[from] ProofError),

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl CommitteeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommitteeError::Validation(_) => ErrorKind::Validation,
            CommitteeError::Authorization(_) | CommitteeError::NotInitialized => ErrorKind::Authorization,
            CommitteeError::NotFound(_) => ErrorKind::NotFound,
            CommitteeError::Conflict(_) => ErrorKind::Conflict,
            CommitteeError::State(_) => ErrorKind::State,
            CommitteeError::Crypto(_) | CommitteeError::Issuance(_) => ErrorKind::Crypto,
            CommitteeError::Storage(_) => ErrorKind::Storage,
        }
    }
}

pub type CommitteeResult<T> = Result<T, CommitteeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issuance_failure_is_a_crypto_error() {
        let err = CommitteeError::from(ProofError::Signature("signing key unavailable".to_string()));
        assert_eq!(err.kind(), ErrorKind::Crypto);
        assert!(err.to_string().starts_with("credential issuance failed"));
    }

    #[test]
    fn test_not_initialized_is_an_authorization_error() {
        assert_eq!(CommitteeError::NotInitialized.kind(), ErrorKind::Authorization);
    }
}
