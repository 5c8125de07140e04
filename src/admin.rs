// src/admin.rs
//
// The all-users view. Unlike the per-user cache this is a one-shot
// listing: fetch every application, fetch every profile, join owner
// emails by uid. Role gating happens at the view boundary; the store
// decides what an admin credential may actually read.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::Result;
use crate::model::{self, fields, ApplicationRecord, ApplicationStatus};
use crate::state::StatusCounts;
use crate::store::{DocumentStore, Fields, Query};

/// One row of the admin table: an application plus its owner's email.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminRow {
    pub record: ApplicationRecord,
    pub owner_email: String,
}

/// Fetches every application with its owner's email joined in. Owners
/// without a profile email show as `"No email"`.
pub async fn list_applications(store: &dyn DocumentStore) -> Result<Vec<AdminRow>> {
    let applications = store.fetch(&Query::all(model::APPLICATIONS)).await?;
    let users = store.fetch(&Query::all(model::USERS)).await?;

    let mut emails: HashMap<&str, &str> = HashMap::new();
    for doc in &users {
        if let Some(email) = doc.str_field(fields::EMAIL) {
            if !email.is_empty() {
                emails.insert(doc.id.as_str(), email);
            }
        }
    }

    let rows = applications
        .iter()
        .filter_map(ApplicationRecord::from_document)
        .map(|record| {
            let owner_email = emails
                .get(record.owner_id.as_str())
                .map(|email| email.to_string())
                .unwrap_or_else(|| "No email".to_string());
            AdminRow {
                record,
                owner_email,
            }
        })
        .collect();

    Ok(rows)
}

/// Sets the status of any user's application.
pub async fn update_status(
    store: &dyn DocumentStore,
    id: &str,
    status: ApplicationStatus,
) -> Result<()> {
    let mut patch = Fields::new();
    patch.insert(
        fields::STATUS.to_string(),
        Value::String(status.as_str().to_string()),
    );
    store.update(model::APPLICATIONS, id, patch).await?;
    Ok(())
}

/// Removes any user's application.
pub async fn delete_application(store: &dyn DocumentStore, id: &str) -> Result<()> {
    store.delete(model::APPLICATIONS, id).await?;
    Ok(())
}

/// Status counts across the whole listing, for the overview cards.
pub fn overview(rows: &[AdminRow]) -> StatusCounts {
    let records: Vec<ApplicationRecord> = rows.iter().map(|row| row.record.clone()).collect();
    StatusCounts::count(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use serde_json::json;

    fn fields_of(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap_or_default()
    }

    async fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store
            .set(
                model::USERS,
                "uid-a",
                fields_of(json!({ "username": "Amal", "email": "amal@example.com", "role": "user" })),
            )
            .await
            .unwrap();
        store
            .set(
                model::USERS,
                "uid-b",
                fields_of(json!({ "username": "Basim", "role": "user" })),
            )
            .await
            .unwrap();
        store
            .create(
                model::APPLICATIONS,
                fields_of(json!({ "uid": "uid-a", "company": "Acme", "position": "Engineer", "status": "applied" })),
            )
            .await
            .unwrap();
        store
            .create(
                model::APPLICATIONS,
                fields_of(json!({ "uid": "uid-b", "company": "Globex", "position": "Analyst", "status": "interview" })),
            )
            .await
            .unwrap();
        store
            .create(
                model::APPLICATIONS,
                fields_of(json!({ "uid": "uid-gone", "company": "Initech", "position": "Clerk", "status": "rejected" })),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_listing_joins_owner_emails() {
        let store = seeded_store().await;
        let rows = list_applications(&store).await.unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].record.company, "Acme");
        assert_eq!(rows[0].owner_email, "amal@example.com");
        // Profile exists but has no (or an empty) email field.
        assert_eq!(rows[1].owner_email, "No email");
        // No profile at all.
        assert_eq!(rows[2].owner_email, "No email");
    }

    #[tokio::test]
    async fn test_update_status_reaches_any_owner() {
        let store = seeded_store().await;
        let rows = list_applications(&store).await.unwrap();
        let id = rows[0].record.id.clone();

        update_status(&store, &id, ApplicationStatus::Accepted)
            .await
            .unwrap();

        let doc = store.get(model::APPLICATIONS, &id).await.unwrap().unwrap();
        assert_eq!(doc.str_field(fields::STATUS), Some("accepted"));
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let store = seeded_store().await;
        let rows = list_applications(&store).await.unwrap();
        let id = rows[2].record.id.clone();

        delete_application(&store, &id).await.unwrap();

        let rows = list_applications(&store).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.record.id != id));
    }

    #[tokio::test]
    async fn test_delete_missing_row_errors() {
        let store = seeded_store().await;
        let err = delete_application(&store, "nope").await.unwrap_err();
        assert!(matches!(err, crate::error::AppError::Store(e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_overview_counts_whole_listing() {
        let store = seeded_store().await;
        let rows = list_applications(&store).await.unwrap();

        let counts = overview(&rows);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.applied, 1);
        assert_eq!(counts.interview, 1);
        assert_eq!(counts.rejected, 1);
        assert_eq!(counts.accepted, 0);
    }
}
