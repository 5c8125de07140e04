// src/state/mod.rs
//
// The application-state layer: one explicit container for session
// identity, the locally cached application list, and the theme
// preference, plus the components that keep it in sync with the data
// service. Writers are the session manager and the cache synchronizer;
// presentation code only reads.

pub mod routes;
mod session;
pub mod stats;
mod sync;
pub mod theme;

pub use routes::{landing_route, Route};
pub use session::SessionManager;
pub use stats::StatusCounts;
pub use sync::NewApplication;
pub use theme::{Theme, ThemePreferences};

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Notify;
use tracing::debug;

use crate::model::{ApplicationRecord, ApplicationStatus, SessionIdentity};

/// Epoch handle minted when a session begins. Cache writes must present
/// the token of the current session; a token from a superseded session
/// is rejected. This is what makes it impossible for one identity's
/// subscription to write into the next identity's cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken {
    epoch: u64,
}

struct Inner {
    epoch: u64,
    identity: Option<SessionIdentity>,
    applications: Vec<ApplicationRecord>,
    theme: Theme,
    version: u64,
}

/// Shared application state.
///
/// Locks are held only long enough to copy data in or out, never
/// across an await point. Consumers that need to react to changes wait
/// on [`AppState::changed`] with the last version they observed.
pub struct AppState {
    inner: RwLock<Inner>,
    notify: Notify,
}

impl AppState {
    pub fn new(theme: Theme) -> AppState {
        AppState {
            inner: RwLock::new(Inner {
                epoch: 0,
                identity: None,
                applications: Vec::new(),
                theme,
                version: 0,
            }),
            notify: Notify::new(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn identity(&self) -> Option<SessionIdentity> {
        self.read().identity.clone()
    }

    pub fn applications(&self) -> Vec<ApplicationRecord> {
        self.read().applications.clone()
    }

    /// Cached applications narrowed to one status, in cache order.
    pub fn applications_with_status(&self, status: ApplicationStatus) -> Vec<ApplicationRecord> {
        self.read()
            .applications
            .iter()
            .filter(|r| r.status == Some(status))
            .cloned()
            .collect()
    }

    /// Status counts derived from the current cache.
    pub fn stats(&self) -> StatusCounts {
        StatusCounts::count(&self.read().applications)
    }

    pub fn theme(&self) -> Theme {
        self.read().theme
    }

    /// Monotonic state version; bumped on every write.
    pub fn version(&self) -> u64 {
        self.read().version
    }

    /// Resolves once the state version exceeds `seen`.
    pub async fn changed(&self, seen: u64) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before re-checking so a write between the check
            // and the await cannot be missed.
            notified.as_mut().enable();
            if self.version() > seen {
                return;
            }
            notified.await;
        }
    }

    /// Theme toggling is the one write performed directly by user
    /// action; callers persist the returned value with
    /// [`ThemePreferences`] if it should survive restarts.
    pub fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut inner = self.write();
            inner.theme = inner.theme.toggled();
            inner.version += 1;
            inner.theme
        };
        self.notify.notify_waiters();
        theme
    }

    pub fn set_theme(&self, theme: Theme) {
        {
            let mut inner = self.write();
            inner.theme = theme;
            inner.version += 1;
        }
        self.notify.notify_waiters();
    }

    /// Install a new session: supersede the previous epoch, store the
    /// identity, clear the cache.
    pub(crate) fn begin_session(&self, identity: SessionIdentity) -> SessionToken {
        let token = {
            let mut inner = self.write();
            inner.epoch += 1;
            inner.identity = Some(identity);
            inner.applications.clear();
            inner.version += 1;
            SessionToken { epoch: inner.epoch }
        };
        self.notify.notify_waiters();
        token
    }

    /// Clear identity and cache and supersede any outstanding token.
    pub(crate) fn end_session(&self) {
        {
            let mut inner = self.write();
            inner.epoch += 1;
            inner.identity = None;
            inner.applications.clear();
            inner.version += 1;
        }
        self.notify.notify_waiters();
    }

    /// Replace the cache in full. Returns false (and changes nothing)
    /// when the token's session has been superseded.
    pub(crate) fn replace_applications(
        &self,
        token: SessionToken,
        records: Vec<ApplicationRecord>,
    ) -> bool {
        {
            let mut inner = self.write();
            if token.epoch != inner.epoch {
                debug!("Dropping snapshot for a superseded session");
                return false;
            }
            inner.applications = records;
            inner.version += 1;
        }
        self.notify.notify_waiters();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use std::sync::Arc;

    fn identity(uid: &str) -> SessionIdentity {
        SessionIdentity {
            uid: uid.to_string(),
            name: uid.to_string(),
            email: format!("{uid}@example.com"),
            role: Role::User,
        }
    }

    fn record(id: &str, owner: &str, status: &str) -> ApplicationRecord {
        ApplicationRecord {
            id: id.to_string(),
            owner_id: owner.to_string(),
            company: String::new(),
            position: String::new(),
            status: ApplicationStatus::parse(status),
            created_at: None,
        }
    }

    #[test]
    fn test_begin_session_resets_cache() {
        let state = AppState::new(Theme::Dark);
        let token = state.begin_session(identity("u1"));
        assert!(state.replace_applications(token, vec![record("a1", "u1", "applied")]));
        assert_eq!(state.applications().len(), 1);

        state.begin_session(identity("u2"));
        assert!(state.applications().is_empty());
        assert_eq!(state.identity().map(|i| i.uid), Some("u2".to_string()));
    }

    #[test]
    fn test_superseded_token_cannot_write() {
        let state = AppState::new(Theme::Dark);
        let token_a = state.begin_session(identity("a"));
        let token_b = state.begin_session(identity("b"));

        assert!(!state.replace_applications(token_a, vec![record("x", "a", "applied")]));
        assert!(state.applications().is_empty());

        assert!(state.replace_applications(token_b, vec![record("y", "b", "applied")]));
        assert_eq!(state.applications()[0].id, "y");

        state.end_session();
        assert!(!state.replace_applications(token_b, vec![record("z", "b", "applied")]));
        assert!(state.applications().is_empty());
        assert_eq!(state.identity(), None);
    }

    #[test]
    fn test_full_replacement() {
        let state = AppState::new(Theme::Dark);
        let token = state.begin_session(identity("u1"));

        state.replace_applications(
            token,
            vec![record("a1", "u1", "applied"), record("a2", "u1", "interview")],
        );
        state.replace_applications(token, vec![record("a2", "u1", "accepted")]);

        let cache = state.applications();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache[0].id, "a2");
        assert_eq!(cache[0].status, Some(ApplicationStatus::Accepted));
    }

    #[test]
    fn test_filtered_reads_and_stats() {
        let state = AppState::new(Theme::Dark);
        let token = state.begin_session(identity("u1"));
        state.replace_applications(
            token,
            vec![
                record("a1", "u1", "applied"),
                record("a2", "u1", "interview"),
                record("a3", "u1", "applied"),
            ],
        );

        let applied = state.applications_with_status(ApplicationStatus::Applied);
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0].id, "a1");
        assert_eq!(state.stats().applied, 2);
        assert_eq!(state.stats().interview, 1);
    }

    #[test]
    fn test_theme_writes_bump_version() {
        let state = AppState::new(Theme::Dark);
        let before = state.version();
        assert_eq!(state.toggle_theme(), Theme::Light);
        assert_eq!(state.theme(), Theme::Light);
        assert!(state.version() > before);

        state.set_theme(Theme::Dark);
        assert_eq!(state.theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_changed_wakes_on_write() {
        let state = Arc::new(AppState::new(Theme::Dark));
        let seen = state.version();

        let waiter = {
            let state = state.clone();
            tokio::spawn(async move {
                state.changed(seen).await;
                state.version()
            })
        };

        state.begin_session(identity("u1"));
        let version = waiter.await.unwrap();
        assert!(version > seen);
    }

    #[tokio::test]
    async fn test_changed_returns_immediately_when_already_past() {
        let state = AppState::new(Theme::Dark);
        let seen = state.version();
        state.toggle_theme();
        // Must not hang even though the notify already fired.
        state.changed(seen).await;
    }
}
