use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("invalid pattern '{pattern}' in permission '{permission}': {reason}")]
    PatternError {
        permission: String,
        pattern: String,
        reason: String,
    },

    #[error("permission '{permission}' references unknown right '{right}'")]
    UnknownRight { permission: String, right: String },

    #[error("principal '{principal}' references unknown permission '{permission}'")]
    UnknownPermission {
        principal: String,
        permission: String,
    },

    #[error("duplicate {kind} name: {name}")]
    DuplicateName { kind: String, name: String },

    #[error("unknown principal: {0}")]
    UnknownPrincipal(String),

    #[error("failed to parse policy document: {0}")]
    ParseError(String),

    #[error("Poisoned lock error: {0}")]
    PoisonedLockError(String),
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::ParseError(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PolicyError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        PolicyError::PoisonedLockError(err.to_string())
    }
}
