// src/state/session.rs
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::sync;
use super::{landing_route, AppState, Route};
use crate::auth::{AuthService, AuthUser};
use crate::error::Result;
use crate::model::{self, Role, SessionIdentity, UserProfile};
use crate::store::{DocumentStore, Fields, Query};

struct ActiveSession {
    uid: String,
    pump: JoinHandle<()>,
}

/// Tracks the single authoritative session identity and drives
/// subscription setup and teardown.
///
/// At most one subscription is open at a time. Switching identities
/// tears the old session down first: the pump task is stopped and the
/// subscription handle dropped (which unsubscribes at the store)
/// before the new session begins, and the state epoch is superseded so
/// a straggling snapshot can never land in the next session's cache.
pub struct SessionManager {
    pub(super) state: Arc<AppState>,
    pub(super) auth: Arc<dyn AuthService>,
    pub(super) store: Arc<dyn DocumentStore>,
    active: Mutex<Option<ActiveSession>>,
}

impl SessionManager {
    pub fn new(
        state: Arc<AppState>,
        auth: Arc<dyn AuthService>,
        store: Arc<dyn DocumentStore>,
    ) -> SessionManager {
        SessionManager {
            state,
            auth,
            store,
            active: Mutex::new(None),
        }
    }

    /// Process one auth transition.
    ///
    /// `Some(user)`: tear down any active session, resolve the role
    /// through a one-time profile lookup (missing profile or a failed
    /// lookup defaults the role, non-fatally), install the enriched
    /// identity, and open the owner-scoped subscription. `None`: tear
    /// down and clear identity and cache.
    ///
    /// A transition for the uid that already owns the active session
    /// is a no-op, which makes it safe for a direct call and the event
    /// stream to both deliver the same sign-in.
    ///
    /// # Errors
    /// Returns the store error when the subscription cannot be
    /// established; the identity stays installed with an empty cache.
    pub async fn handle_identity_change(&self, user: Option<AuthUser>) -> Result<()> {
        let mut active = self.active.lock().await;

        let user = match user {
            Some(user) => user,
            None => {
                Self::teardown(&mut active).await;
                self.state.end_session();
                debug!("Session cleared");
                return Ok(());
            }
        };

        if active.as_ref().map(|a| a.uid.as_str()) == Some(user.uid.as_str()) {
            return Ok(());
        }

        Self::teardown(&mut active).await;

        let profile = self.lookup_profile(&user.uid).await;
        let identity = SessionIdentity::new(&user, profile.as_ref());
        info!(
            "Session started for {} ({})",
            identity.email,
            identity.role.as_str()
        );

        let token = self.state.begin_session(identity);

        let query = Query::field_eq(model::APPLICATIONS, model::fields::OWNER, user.uid.clone());
        let subscription = match self.store.subscribe(query).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!("Could not subscribe to applications: {}", e);
                return Err(e.into());
            }
        };

        sync::apply_snapshot(&self.state, token, &subscription.initial);

        let pump = tokio::spawn(sync::pump(self.state.clone(), token, subscription));
        *active = Some(ActiveSession {
            uid: user.uid,
            pump,
        });
        Ok(())
    }

    /// Stop the pump and wait for it to wind down, so the subscription
    /// handle is dropped and the store unsubscribed before the caller
    /// proceeds.
    async fn teardown(active: &mut Option<ActiveSession>) {
        if let Some(session) = active.take() {
            session.pump.abort();
            let _ = session.pump.await;
            debug!("Closed application subscription");
        }
    }

    async fn lookup_profile(&self, uid: &str) -> Option<UserProfile> {
        match self.store.get(model::USERS, uid).await {
            Ok(Some(doc)) => Some(UserProfile::from_document(&doc)),
            Ok(None) => {
                debug!("No profile document for {}, using default role", uid);
                None
            }
            Err(e) => {
                warn!("Profile lookup failed for {}: {}, using default role", uid, e);
                None
            }
        }
    }

    /// Register a new account: create the credentials, write the
    /// profile document, start the session. The fresh profile always
    /// carries the `user` role.
    pub async fn register(&self, email: &str, password: &str, username: &str) -> Result<Route> {
        let user = self.auth.sign_up(email, password).await?;

        let mut fields = Fields::new();
        fields.insert(model::fields::USERNAME.to_string(), username.into());
        fields.insert(model::fields::EMAIL.to_string(), email.into());
        fields.insert(model::fields::ROLE.to_string(), Role::User.as_str().into());
        if let Err(e) = self.store.set(model::USERS, &user.uid, fields).await {
            // The account exists either way; a missing profile only
            // costs the display name until it is written again.
            warn!("Could not write profile for {}: {}", user.uid, e);
        }

        self.handle_identity_change(Some(user)).await?;
        Ok(self.settled_landing_route())
    }

    /// Sign in and return the landing route, resolved only after the
    /// role lookup inside the transition has settled.
    pub async fn login(&self, email: &str, password: &str) -> Result<Route> {
        let user = self.auth.sign_in(email, password).await?;
        self.handle_identity_change(Some(user)).await?;
        Ok(self.settled_landing_route())
    }

    pub async fn logout(&self) -> Result<()> {
        self.auth.sign_out().await?;
        self.handle_identity_change(None).await
    }

    fn settled_landing_route(&self) -> Route {
        let role = self
            .state
            .identity()
            .map(|identity| identity.role)
            .unwrap_or_default();
        landing_route(role)
    }

    /// Drive the manager from the auth service's event stream. Spawn
    /// once at startup; this also covers transitions that happen
    /// without a local call, like a persisted-session restore or an
    /// externally invalidated session.
    pub async fn run(self: Arc<Self>) {
        let mut events = self.auth.subscribe();
        while let Some(transition) = events.next().await {
            if let Err(e) = self.handle_identity_change(transition).await {
                warn!("Failed to process auth transition: {}", e);
            }
        }
        debug!("Auth event stream ended");
    }
}
