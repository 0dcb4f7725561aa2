use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const FACT_CHECKING: &str = "fact_checking";
pub const PARTY_AVERAGES: &str = "party_averages";
pub const AUTHOR_AVERAGES: &str = "author_averages";

/// JSON documents grouped into named collections.
pub struct DocumentStore {
    pool: SqlitePool,
}

/// Per-call write counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Lowercase with spaces turned into underscores.
pub fn slugify(value: &str) -> String {
    value.replace(' ', "_").to_lowercase()
}

/// Serialize a row into a document body. Non-finite floats become null.
pub fn to_document<T: Serialize>(row: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(row).context("Failed to serialize row")? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("Row is not a JSON object: {other}")),
    }
}

fn document_id(doc: &Map<String, Value>, id_field: &str) -> Result<String> {
    match doc.get(id_field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(anyhow!("Row has no usable '{id_field}' field")),
    }
}

impl DocumentStore {
    pub async fn open(database_path: &str) -> Result<Self> {
        let in_memory = database_path == ":memory:";
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))
            .context("Invalid database path")?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // Every in-memory connection is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;

        info!(path = database_path, "Document store opened");
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        let migration_sql = include_str!("../../migrations/001_init.sql");
        for statement in migration_sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .with_context(|| format!("Failed to execute migration: {trimmed}"))?;
            }
        }
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
        info!("Document store closed");
    }

    pub async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND doc_id = ?")
            .bind(collection)
            .bind(doc_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch document")?;

        row.map(|r| {
            let data: String = r.get("data");
            serde_json::from_str(&data).context("Stored document is not valid JSON")
        })
        .transpose()
    }

    pub async fn count(&self, collection: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count documents")?;
        Ok(row.get("n"))
    }

    async fn write(&self, collection: &str, doc_id: &str, data: &Map<String, Value>) -> Result<()> {
        let body = serde_json::to_string(data).context("Failed to encode document")?;
        sqlx::query(
            "INSERT INTO documents (collection, doc_id, data, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(collection, doc_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(collection)
        .bind(doc_id)
        .bind(body)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to write document")?;
        Ok(())
    }

    async fn merge_one(
        &self,
        collection: &str,
        doc_id: &str,
        doc: Map<String, Value>,
    ) -> Result<()> {
        let mut merged = match self.get(collection, doc_id).await? {
            Some(Value::Object(existing)) => existing,
            _ => Map::new(),
        };
        merged.extend(doc);
        self.write(collection, doc_id, &merged).await
    }

    async fn insert_one(
        &self,
        collection: &str,
        doc_id: &str,
        doc: Map<String, Value>,
    ) -> Result<bool> {
        let body = serde_json::to_string(&doc).context("Failed to encode document")?;
        let result = sqlx::query(
            "INSERT INTO documents (collection, doc_id, data, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(collection, doc_id) DO NOTHING",
        )
        .bind(collection)
        .bind(doc_id)
        .bind(body)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to insert document")?;
        Ok(result.rows_affected() > 0)
    }

    /// Merge each row into the document keyed by the slug of its `id_field`.
    /// Fields in the row overwrite, other stored fields are kept.
    pub async fn upsert_grouped<T: Serialize>(
        &self,
        collection: &str,
        rows: &[T],
        id_field: &str,
    ) -> UpsertStats {
        let mut stats = UpsertStats::default();
        for row in rows {
            let result = async {
                let doc = to_document(row)?;
                let doc_id = slugify(&document_id(&doc, id_field)?);
                self.merge_one(collection, &doc_id, doc).await
            }
            .await;
            match result {
                Ok(()) => stats.written += 1,
                Err(e) => {
                    warn!(collection, error = %e, "Skipping row");
                    stats.failed += 1;
                }
            }
        }
        info!(collection, written = stats.written, failed = stats.failed, "Grouped upsert done");
        stats
    }

    /// Insert each row under its raw `id_field` unless a document already exists.
    pub async fn upsert_new<T: Serialize>(
        &self,
        collection: &str,
        rows: &[T],
        id_field: &str,
    ) -> UpsertStats {
        let mut stats = UpsertStats::default();
        for row in rows {
            let result = async {
                let doc = to_document(row)?;
                let doc_id = document_id(&doc, id_field)?;
                self.insert_one(collection, &doc_id, doc).await
            }
            .await;
            match result {
                Ok(true) => stats.written += 1,
                Ok(false) => {
                    debug!(collection, "Document exists, left untouched");
                    stats.skipped += 1;
                }
                Err(e) => {
                    warn!(collection, error = %e, "Skipping row");
                    stats.failed += 1;
                }
            }
        }
        info!(
            collection,
            written = stats.written,
            skipped = stats.skipped,
            failed = stats.failed,
            "Insert-if-absent done"
        );
        stats
    }
}
