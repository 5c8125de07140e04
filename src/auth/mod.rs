// src/auth/mod.rs
//
// Contract for the authentication provider. The provider issues the
// session identity and announces sign-in/sign-out transitions; role is
// NOT part of this contract, it comes from the profile document.

mod local;

pub use local::LocalAuth;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Identity as issued by the provider, before role enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

/// User-facing authentication failures. The messages are what the
/// sign-in and registration views display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email format.")]
    InvalidEmail,

    #[error("Password should be at least 6 characters.")]
    WeakPassword,

    #[error("An account with this email already exists.")]
    EmailInUse,

    #[error("No account found with this email.")]
    UserNotFound,

    #[error("Incorrect password.")]
    WrongPassword,

    #[error("This account has been disabled.")]
    AccountDisabled,

    #[error("Too many failed attempts. Try again later.")]
    TooManyRequests,

    #[error("Network error. Check your connection.")]
    Unavailable,
}

/// Stream of auth-state transitions. The current state is delivered
/// first, then one item per change; `Some(user)` on sign-in, `None` on
/// sign-out or session invalidation.
pub struct AuthEvents {
    receiver: mpsc::UnboundedReceiver<Option<AuthUser>>,
}

impl AuthEvents {
    pub fn new(receiver: mpsc::UnboundedReceiver<Option<AuthUser>>) -> AuthEvents {
        AuthEvents { receiver }
    }

    /// Next transition; outer `None` once the provider is gone.
    pub async fn next(&mut self) -> Option<Option<AuthUser>> {
        self.receiver.recv().await
    }

    /// Non-blocking variant; `None` when no transition is queued.
    pub fn try_next(&mut self) -> Option<Option<AuthUser>> {
        self.receiver.try_recv().ok()
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Subscribe to auth-state transitions; see [`AuthEvents`].
    fn subscribe(&self) -> AuthEvents;
}
