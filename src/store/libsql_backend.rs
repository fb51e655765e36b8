//! libSQL backend: async `RecordStore` implementation.
//!
//! Records live in a single `records` table as JSON text keyed by collection.
//! Filtering and ordering run in process over the collection's rows.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{
    Collection, Filter, Order, RecordId, RecordStore, StoredRecord, apply_patch, sort_records,
};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db)?;
        migrations::run_migrations(&store.conn).await?;
        info!(path = %path.display(), "Database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let store = Self::from_database(db)?;
        migrations::run_migrations(&store.conn).await?;
        Ok(store)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    async fn load_data(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<Option<Value>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT data FROM records WHERE id = ?1 AND collection = ?2",
                params![id.as_str(), collection.as_str()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("load_data: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let raw: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("load_data: {e}")))?;
                serde_json::from_str(&raw)
                    .map(Some)
                    .map_err(|e| DatabaseError::Serialization(e.to_string()))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("load_data: {e}"))),
        }
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Map a row of `id, data, created_at` to a StoredRecord.
fn row_to_record(row: &libsql::Row) -> Result<StoredRecord, DatabaseError> {
    let id: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("row id: {e}")))?;
    let raw: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("row data: {e}")))?;
    let created: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("row created_at: {e}")))?;
    let data = serde_json::from_str(&raw).map_err(|e| DatabaseError::Serialization(e.to_string()))?;

    Ok(StoredRecord {
        id: RecordId(id),
        created_at: parse_datetime(&created),
        data,
    })
}

#[async_trait]
impl RecordStore for LibSqlStore {
    async fn insert(
        &self,
        collection: Collection,
        record: Value,
    ) -> Result<RecordId, DatabaseError> {
        if !record.is_object() {
            return Err(DatabaseError::Serialization(
                "records must be JSON objects".to_string(),
            ));
        }
        let id = RecordId::generate();
        let now = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        let data = serde_json::to_string(&record)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO records (id, collection, data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![id.as_str(), collection.as_str(), data, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert: {e}")))?;

        debug!(%collection, %id, "Inserted record");
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Value,
    ) -> Result<(), DatabaseError> {
        let mut data = self
            .load_data(collection, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: collection.to_string(),
                id: id.to_string(),
            })?;
        apply_patch(&mut data, patch)?;

        let raw =
            serde_json::to_string(&data).map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE records SET data = ?1, updated_at = ?2 WHERE id = ?3 AND collection = ?4",
                params![raw, now, id.as_str(), collection.as_str()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update: {e}")))?;
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<StoredRecord>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, data, created_at FROM records WHERE collection = ?1 ORDER BY rowid",
                params![collection.as_str()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("query: {e}")))?;

        let mut records = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => {
                    let record = row_to_record(&row)?;
                    if filter.matches(&record) {
                        records.push(record);
                    }
                }
                Ok(None) => break,
                Err(e) => return Err(DatabaseError::Query(format!("query: {e}"))),
            }
        }

        if let Some(order) = order {
            sort_records(&mut records, order);
        }
        Ok(records)
    }
}
