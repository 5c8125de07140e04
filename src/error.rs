// src/error.rs
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Errors surfaced by the state layer to its callers (the view layer).
///
/// Collaborator failures keep their own types; the variants added here
/// cover conditions the state layer itself detects.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A mutation or read was requested with no signed-in identity.
    #[error("no user is signed in")]
    NotSignedIn,
}

impl AppError {
    /// True for failures the view shows as a sign-in alert.
    pub fn is_auth(&self) -> bool {
        matches!(self, AppError::Auth(_))
    }

    pub fn is_not_signed_in(&self) -> bool {
        matches!(self, AppError::NotSignedIn)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
