// src/auth/local.rs
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AuthError, AuthEvents, AuthService, AuthUser};

struct Account {
    uid: String,
    password: String,
    disabled: bool,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    current: Option<AuthUser>,
    listeners: Vec<mpsc::UnboundedSender<Option<AuthUser>>>,
}

/// In-process authentication provider.
///
/// Stands in for the hosted provider during development and in tests.
/// Credentials live in memory and are compared in the clear; this is a
/// stand-in, not a credential store. Deployments against the hosted
/// provider implement [`AuthService`] over its SDK instead.
#[derive(Default)]
pub struct LocalAuth {
    inner: Mutex<Inner>,
}

impl LocalAuth {
    pub fn new() -> LocalAuth {
        LocalAuth::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn broadcast(inner: &mut Inner) {
        let state = inner.current.clone();
        inner.listeners.retain(|tx| tx.send(state.clone()).is_ok());
    }

    /// Mark an account disabled. Existing sessions keep running until
    /// invalidated; the next sign-in fails.
    pub fn disable(&self, email: &str) {
        let mut inner = self.lock();
        if let Some(account) = inner.accounts.get_mut(email) {
            account.disabled = true;
            info!("Disabled account {}", email);
        }
    }

    /// Drop the current session without user action (token expiry or
    /// server-side revocation). Listeners receive a `None` transition.
    pub fn invalidate_session(&self) {
        let mut inner = self.lock();
        if inner.current.take().is_some() {
            debug!("Session invalidated externally");
            Self::broadcast(&mut inner);
        }
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.lock().current.clone()
    }
}

/// Cheap shape check; the hosted provider rejects the same way before
/// ever hitting an account.
fn validate_email(email: &str) -> Result<(), AuthError> {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() {
        return Err(AuthError::InvalidEmail);
    }
    Ok(())
}

#[async_trait]
impl AuthService for LocalAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        validate_email(email)?;
        if password.chars().count() < 6 {
            return Err(AuthError::WeakPassword);
        }

        let mut inner = self.lock();
        if inner.accounts.contains_key(email) {
            return Err(AuthError::EmailInUse);
        }

        let uid = Uuid::new_v4().to_string();
        inner.accounts.insert(
            email.to_string(),
            Account {
                uid: uid.clone(),
                password: password.to_string(),
                disabled: false,
            },
        );
        let user = AuthUser {
            uid,
            email: email.to_string(),
        };
        inner.current = Some(user.clone());
        Self::broadcast(&mut inner);

        info!("Registered account for {}", email);
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        validate_email(email)?;

        let mut inner = self.lock();
        let account = match inner.accounts.get(email) {
            Some(account) => account,
            None => return Err(AuthError::UserNotFound),
        };
        if account.disabled {
            return Err(AuthError::AccountDisabled);
        }
        if account.password != password {
            return Err(AuthError::WrongPassword);
        }

        let user = AuthUser {
            uid: account.uid.clone(),
            email: email.to_string(),
        };
        inner.current = Some(user.clone());
        Self::broadcast(&mut inner);

        debug!("Signed in {}", email);
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut inner = self.lock();
        if inner.current.take().is_some() {
            Self::broadcast(&mut inner);
            debug!("Signed out");
        }
        Ok(())
    }

    fn subscribe(&self) -> AuthEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        // Deliver the state as of subscription before any transition.
        tx.send(inner.current.clone()).ok();
        inner.listeners.push(tx);
        AuthEvents::new(rx)
    }
}
