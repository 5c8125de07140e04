// src/store/sqlite.rs
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    Document, DocumentStore, Fields, Query, Snapshot, StoreError, Subscription,
    SubscriptionGuard, CREATED_AT,
};

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    fields: String,
}

impl DocumentRow {
    fn into_document(self) -> Result<Document, StoreError> {
        let fields: Fields = serde_json::from_str(&self.fields)
            .map_err(|e| StoreError::InvalidData(format!("document {}: {}", self.id, e)))?;
        Ok(Document {
            id: self.id,
            fields,
        })
    }
}

struct Subscriber {
    id: u64,
    query: Query,
    sender: mpsc::UnboundedSender<Snapshot>,
}

#[derive(Default)]
struct SubscriberTable {
    next_id: u64,
    entries: Vec<Subscriber>,
}

/// Document store backed by a local sqlite database.
///
/// Live queries are served in-process: after every mutation the store
/// re-evaluates each registered query on the touched collection and
/// pushes the fresh snapshot to its subscriber.
pub struct SqliteStore {
    pool: SqlitePool,
    subscribers: Arc<Mutex<SubscriberTable>>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path` and run migrations.
    pub async fn open(path: &Path) -> Result<SqliteStore, StoreError> {
        let url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&url).await?;
        let store = SqliteStore::with_pool(pool).await?;
        info!("Document store ready at {}", path.display());
        Ok(store)
    }

    /// Purely in-memory database, used by tests and throwaway setups.
    pub async fn open_in_memory() -> Result<SqliteStore, StoreError> {
        // A pooled :memory: database exists per connection; keep exactly
        // one connection alive so every query sees the same data.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await?;
        SqliteStore::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<SqliteStore, StoreError> {
        let store = SqliteStore {
            pool,
            subscribers: Arc::default(),
        };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                fields TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of currently registered live queries.
    pub fn active_subscriptions(&self) -> usize {
        self.lock_table().entries.len()
    }

    fn lock_table(&self) -> MutexGuard<'_, SubscriberTable> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Push a fresh snapshot to every subscriber on `collection`.
    async fn notify(&self, collection: &str) {
        let targets: Vec<(u64, Query, mpsc::UnboundedSender<Snapshot>)> = self
            .lock_table()
            .entries
            .iter()
            .filter(|s| s.query.collection == collection)
            .map(|s| (s.id, s.query.clone(), s.sender.clone()))
            .collect();

        for (id, query, sender) in targets {
            match self.fetch(&query).await {
                Ok(snapshot) => {
                    if sender.send(snapshot).is_err() {
                        debug!("Subscriber {} is gone, push dropped", id);
                    }
                }
                Err(e) => {
                    warn!("Failed to evaluate subscription {}: {}", id, e);
                }
            }
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, fields FROM documents WHERE collection = ?1 AND id = ?2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DocumentRow::into_document).transpose()
    }

    async fn create(&self, collection: &str, mut fields: Fields) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        if !fields.contains_key(CREATED_AT) {
            fields.insert(
                CREATED_AT.to_string(),
                serde_json::Value::String(Utc::now().to_rfc3339()),
            );
        }
        let payload =
            serde_json::to_string(&fields).map_err(|e| StoreError::InvalidData(e.to_string()))?;

        sqlx::query("INSERT INTO documents (collection, id, fields) VALUES (?1, ?2, ?3)")
            .bind(collection)
            .bind(&id)
            .bind(payload)
            .execute(&self.pool)
            .await?;

        debug!("Created document {}/{}", collection, id);
        self.notify(collection).await;
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, mut fields: Fields) -> Result<(), StoreError> {
        if !fields.contains_key(CREATED_AT) {
            fields.insert(
                CREATED_AT.to_string(),
                serde_json::Value::String(Utc::now().to_rfc3339()),
            );
        }
        let payload =
            serde_json::to_string(&fields).map_err(|e| StoreError::InvalidData(e.to_string()))?;

        // Upsert keeps the original rowid, so replacing a document does
        // not move it within snapshot order.
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, fields) VALUES (?1, ?2, ?3)
            ON CONFLICT (collection, id) DO UPDATE SET fields = excluded.fields
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(payload)
        .execute(&self.pool)
        .await?;

        debug!("Set document {}/{}", collection, id);
        self.notify(collection).await;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let existing = self
            .get(collection, id)
            .await?
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        let mut merged = existing.fields;
        for (key, value) in fields {
            merged.insert(key, value);
        }
        let payload =
            serde_json::to_string(&merged).map_err(|e| StoreError::InvalidData(e.to_string()))?;

        let result =
            sqlx::query("UPDATE documents SET fields = ?3 WHERE collection = ?1 AND id = ?2")
                .bind(collection)
                .bind(id)
                .bind(payload)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }

        debug!("Updated document {}/{}", collection, id);
        self.notify(collection).await;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }

        debug!("Deleted document {}/{}", collection, id);
        self.notify(collection).await;
        Ok(())
    }

    async fn fetch(&self, query: &Query) -> Result<Snapshot, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, fields FROM documents WHERE collection = ?1 ORDER BY rowid",
        )
        .bind(&query.collection)
        .fetch_all(&self.pool)
        .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let doc = row.into_document()?;
            if query.matches(&doc) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        let initial = self.fetch(&query).await?;
        let (sender, receiver) = mpsc::unbounded_channel();

        let id = {
            let mut table = self.lock_table();
            let id = table.next_id;
            table.next_id += 1;
            table.entries.push(Subscriber {
                id,
                query: query.clone(),
                sender,
            });
            id
        };
        debug!("Opened subscription {} on {}", id, query.collection);

        let subscribers = Arc::clone(&self.subscribers);
        let guard = SubscriptionGuard::new(move || {
            let mut table = subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            table.entries.retain(|s| s.id != id);
        });

        Ok(Subscription::new(initial, receiver, guard))
    }
}
