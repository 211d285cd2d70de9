//! Persistence collaborator contract and its SQLite implementation
//!
//! `FlowStore` talks to storage only through `FlowPersistence`. Implementations own
//! atomicity: a failed or cancelled `put` must never expose a half-written record to
//! a later `get`. Flows are stored as JSON documents with indexed lookup columns.

use crate::error::PersistenceError;
use crate::flow::types::{AutomationFlow, FlowId};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::Path;

/// Durable storage for flow records
#[async_trait]
pub trait FlowPersistence: Send + Sync {
    /// The record stored under `id`, if any.
    async fn get(&self, id: FlowId) -> Result<Option<AutomationFlow>, PersistenceError>;

    /// Insert or replace the record under `id` in one atomic step.
    async fn put(&self, id: FlowId, flow: &AutomationFlow) -> Result<(), PersistenceError>;

    /// All records of a scope, oldest first.
    async fn list(&self, scope: &str) -> Result<Vec<AutomationFlow>, PersistenceError>;
}

/// SQLite-based flow storage
#[derive(Debug, Clone)]
pub struct SqliteFlowStorage {
    pool: SqlitePool,
}

impl SqliteFlowStorage {
    /// Wrap an existing pool. Call `init_schema` before use.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database file at `path` and prepare the schema.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        tracing::info!("Opening flow database: {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Private in-memory database, mainly for tests.
    ///
    /// Pinned to a single connection that is never recycled: every SQLite memory
    /// connection is its own database.
    pub async fn in_memory() -> Result<Self, PersistenceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Create the flows table and its scope index. Safe to call repeatedly.
    pub async fn init_schema(&self) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS flows (
                id TEXT PRIMARY KEY,
                scope TEXT NOT NULL,
                name TEXT NOT NULL,
                definition JSON NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_flows_scope
            ON flows(scope)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl FlowPersistence for SqliteFlowStorage {
    async fn get(&self, id: FlowId) -> Result<Option<AutomationFlow>, PersistenceError> {
        let row = sqlx::query("SELECT definition FROM flows WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let definition: String = row.get("definition");
                Ok(Some(serde_json::from_str(&definition)?))
            }
            None => Ok(None),
        }
    }

    // A single UPSERT statement: SQLite applies it entirely or not at all.
    async fn put(&self, id: FlowId, flow: &AutomationFlow) -> Result<(), PersistenceError> {
        let definition = serde_json::to_string(flow)?;

        sqlx::query(
            r#"
            INSERT INTO flows (id, scope, name, definition, updated_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO UPDATE SET
                scope = excluded.scope,
                name = excluded.name,
                definition = excluded.definition,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(id.to_string())
        .bind(&flow.scope)
        .bind(&flow.name)
        .bind(&definition)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Stored flow {} (version {})", id, flow.version);
        Ok(())
    }

    async fn list(&self, scope: &str) -> Result<Vec<AutomationFlow>, PersistenceError> {
        let rows = sqlx::query("SELECT definition FROM flows WHERE scope = ? ORDER BY rowid")
            .bind(scope)
            .fetch_all(&self.pool)
            .await?;

        let mut flows = Vec::with_capacity(rows.len());
        for row in rows {
            let definition: String = row.get("definition");
            flows.push(serde_json::from_str(&definition)?);
        }

        Ok(flows)
    }
}
