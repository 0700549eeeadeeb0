//! # AppError
//!
//! Centralized error handling for the GitView stores.
//! Maps data-access failures to the categories the UI reacts to.

use thiserror::Error;

/// The primary error type for all store operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Referenced record is absent (e.g., RepoPost)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Empty or oversize text
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Caller is not the author of the record it tried to change
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Action needs a signed-in session
    #[error("sign-in required")]
    AuthRequired,

    /// The email is already linked to an account under another provider
    #[error("an account already exists for {email} with a different sign-in provider")]
    AccountConflict { email: String },

    /// Identity provider, database, GitHub or translation failure
    #[error("external service error: {0}")]
    ExternalService(String),

    /// Local failure that is not the caller's fault
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Errors the user can fix from the form that raised them.
    /// Everything else is shown as a generic failure.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            AppError::ValidationError(_) | AppError::AuthRequired | AppError::AccountConflict { .. }
        )
    }

    pub fn external(err: impl std::fmt::Display) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

/// Failures reported by an identity provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("account exists with different credential: {email}")]
    AccountExistsWithDifferentCredential { email: String },

    #[error("sign-in cancelled")]
    Cancelled,

    #[error("identity provider error: {0}")]
    Other(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::AccountExistsWithDifferentCredential { email } => {
                AppError::AccountConflict { email }
            }
            other => AppError::ExternalService(other.to_string()),
        }
    }
}

/// A specialized Result type for GitView store logic.
pub type Result<T> = std::result::Result<T, AppError>;
