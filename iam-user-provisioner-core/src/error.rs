//! Error types for the IAM user provisioner.

use thiserror::Error;

/// All failures surfaced by the provisioner library.
#[derive(Error, Debug)]
pub enum ProvisionerError {
    #[error("invalid user name '{name}': {reason}")]
    InvalidUserName { name: String, reason: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("no role selected for user '{0}': set devuser or qauser")]
    NoRole(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{operation} failed: {message}")]
    Backend { operation: String, message: String },

    #[error("user '{0}' does not exist")]
    UserNotFound(String),

    #[error("user '{0}' already exists")]
    UserExists(String),

    #[error("refusing to destroy user '{user}': {reason}")]
    DestroyBlocked { user: String, reason: String },

    #[error("inline policy '{policy_name}' on user '{user}' differs from the planned document")]
    PolicyMismatch { user: String, policy_name: String },
}

impl ProvisionerError {
    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<serde_json::Error> for ProvisionerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type ProvisionerResult<T> = Result<T, ProvisionerError>;
