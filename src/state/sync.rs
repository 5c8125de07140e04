// src/state/sync.rs
//
// Cache synchronization: every snapshot the subscription delivers
// replaces the local cache in full, and mutations go straight to the
// store. The cache changes only when the store pushes; a mutation's
// effect becomes visible on the next snapshot, never before.

use std::sync::Arc;

use tracing::debug;

use super::session::SessionManager;
use super::{AppState, SessionToken};
use crate::error::{AppError, Result};
use crate::model::{self, ApplicationRecord, ApplicationStatus};
use crate::store::{Fields, Snapshot, Subscription};

/// Input for a new application. Status defaults to `Applied`, the
/// state every application starts in.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub company: String,
    pub position: String,
    pub status: ApplicationStatus,
}

impl NewApplication {
    pub fn new(company: impl Into<String>, position: impl Into<String>) -> NewApplication {
        NewApplication {
            company: company.into(),
            position: position.into(),
            status: ApplicationStatus::Applied,
        }
    }

    pub fn with_status(mut self, status: ApplicationStatus) -> NewApplication {
        self.status = status;
        self
    }
}

/// Decode a delivered snapshot into typed records. Documents that
/// cannot be attributed to an owner are dropped here, at the boundary.
pub(super) fn decode_snapshot(snapshot: &Snapshot) -> Vec<ApplicationRecord> {
    snapshot
        .iter()
        .filter_map(ApplicationRecord::from_document)
        .collect()
}

/// Apply one snapshot as a full replacement of the cache. Returns
/// false when the token's session has been superseded.
pub(super) fn apply_snapshot(
    state: &AppState,
    token: SessionToken,
    snapshot: &Snapshot,
) -> bool {
    let records = decode_snapshot(snapshot);
    let count = records.len();
    let applied = state.replace_applications(token, records);
    if applied {
        debug!("Applied snapshot with {} record(s)", count);
    }
    applied
}

/// Drain pushed snapshots for one session. Ends when the store side
/// closes or the session is superseded; dropping the subscription on
/// the way out unsubscribes.
pub(super) async fn pump(
    state: Arc<AppState>,
    token: SessionToken,
    mut subscription: Subscription,
) {
    while let Some(snapshot) = subscription.next().await {
        if !apply_snapshot(&state, token, &snapshot) {
            break;
        }
    }
}

impl SessionManager {
    fn require_uid(&self) -> Result<String> {
        self.state
            .identity()
            .map(|identity| identity.uid)
            .ok_or(AppError::NotSignedIn)
    }

    /// Create an application for the signed-in user. The local cache
    /// is not touched; the record appears when the next snapshot
    /// arrives.
    pub async fn create_application(&self, input: NewApplication) -> Result<String> {
        let uid = self.require_uid()?;

        let mut fields = Fields::new();
        fields.insert(model::fields::OWNER.to_string(), uid.into());
        fields.insert(model::fields::COMPANY.to_string(), input.company.into());
        fields.insert(model::fields::POSITION.to_string(), input.position.into());
        fields.insert(
            model::fields::STATUS.to_string(),
            input.status.as_str().into(),
        );

        let id = self.store.create(model::APPLICATIONS, fields).await?;
        debug!("Created application {}", id);
        Ok(id)
    }

    /// Change one application's status. Confirmation comes through the
    /// subscription, not from this call.
    pub async fn update_status(&self, id: &str, status: ApplicationStatus) -> Result<()> {
        self.require_uid()?;

        let mut fields = Fields::new();
        fields.insert(model::fields::STATUS.to_string(), status.as_str().into());
        self.store.update(model::APPLICATIONS, id, fields).await?;
        Ok(())
    }

    /// Delete one application. A failure leaves the cache as it was;
    /// nothing is removed locally ahead of the store.
    pub async fn delete_application(&self, id: &str) -> Result<()> {
        self.require_uid()?;
        self.store.delete(model::APPLICATIONS, id).await?;
        Ok(())
    }
}
