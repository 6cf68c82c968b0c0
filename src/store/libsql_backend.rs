//! libSQL response store.
//!
//! One row per template name; saving replaces the row's document. Supports
//! local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;

use super::migrations;
use super::traits::ResponseStore;
use crate::error::StoreError;
use crate::interview::model::ConversationResponse;

/// libSQL-backed `ResponseStore`.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Response database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to create in-memory database: {e}")))?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, StoreError> {
        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[async_trait]
impl ResponseStore for LibSqlStore {
    fn name(&self) -> &str {
        "libsql"
    }

    async fn save_response(&self, response: &ConversationResponse) -> Result<(), StoreError> {
        let document = serde_json::to_string(response)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        let answers = response.answer_count() as i64;

        self.conn()
            .execute(
                "INSERT INTO responses (template_name, document, answer_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT (template_name) DO UPDATE
                 SET document = ?2, answer_count = ?3, updated_at = ?4",
                params![response.template_name.as_str(), document, answers, now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("save_response: {e}")))?;

        info!(template = %response.template_name, answers, "Response stored");
        Ok(())
    }

    async fn get_response(
        &self,
        template_name: &str,
    ) -> Result<Option<ConversationResponse>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT document FROM responses WHERE template_name = ?1",
                params![template_name],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get_response: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let document: String = row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("get_response: {e}")))?;
                let response = serde_json::from_str(&document)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(response))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get_response: {e}"))),
        }
    }

    async fn list_template_names(&self) -> Result<Vec<String>, StoreError> {
        let mut rows = self
            .conn()
            .query("SELECT template_name FROM responses ORDER BY template_name", ())
            .await
            .map_err(|e| StoreError::Query(format!("list_template_names: {e}")))?;

        let mut names = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("list_template_names: {e}")))?
        {
            let name: String = row
                .get(0)
                .map_err(|e| StoreError::Query(format!("list_template_names: {e}")))?;
            names.push(name);
        }
        Ok(names)
    }
}
