//! In-process `RecordStore`: used by tests and headless callers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::DatabaseError;
use crate::store::traits::{
    Collection, Filter, Order, RecordId, RecordStore, StoredRecord, apply_patch, sort_records,
};

#[derive(Default)]
struct Inner {
    collections: HashMap<Collection, Vec<StoredRecord>>,
    last_created: Option<DateTime<Utc>>,
}

/// Records held in memory, in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record in a collection.
    pub async fn all(&self, collection: Collection) -> Vec<StoredRecord> {
        self.inner
            .read()
            .await
            .collections
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
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
        let mut inner = self.inner.write().await;

        // Strictly increasing timestamps keep created_at ordering unambiguous.
        let mut created_at = Utc::now();
        if let Some(last) = inner.last_created {
            if created_at <= last {
                created_at = last + Duration::microseconds(1);
            }
        }
        inner.last_created = Some(created_at);

        let id = RecordId::generate();
        inner
            .collections
            .entry(collection)
            .or_default()
            .push(StoredRecord {
                id: id.clone(),
                created_at,
                data: record,
            });
        tracing::debug!(%collection, %id, "Inserted record");
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Value,
    ) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .collections
            .get_mut(&collection)
            .and_then(|records| records.iter_mut().find(|r| &r.id == id))
            .ok_or_else(|| DatabaseError::NotFound {
                entity: collection.to_string(),
                id: id.to_string(),
            })?;
        apply_patch(&mut record.data, patch)
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<StoredRecord>, DatabaseError> {
        let inner = self.inner.read().await;
        let mut records: Vec<StoredRecord> = inner
            .collections
            .get(&collection)
            .map(|records| records.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = order {
            sort_records(&mut records, order);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_then_query() {
        let store = MemoryStore::new();
        let id = store
            .insert(Collection::FoundAnimals, json!({"species": "dog"}))
            .await
            .unwrap();
        let rows = store
            .query(Collection::FoundAnimals, &Filter::new(), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].data["species"], "dog");
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = MemoryStore::new();
        store
            .insert(Collection::FoundAnimals, json!({"a": 1}))
            .await
            .unwrap();
        let rows = store
            .query(Collection::ChatSessions, &Filter::new(), None)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn insert_rejects_non_object() {
        let store = MemoryStore::new();
        let result = store.insert(Collection::FoundAnimals, json!("nope")).await;
        assert!(matches!(result, Err(DatabaseError::Serialization(_))));
    }

    #[tokio::test]
    async fn update_merges_patch() {
        let store = MemoryStore::new();
        let id = store
            .insert(Collection::ChatSessions, json!({"user_id": "u", "messages": []}))
            .await
            .unwrap();
        store
            .update(Collection::ChatSessions, &id, json!({"messages": [1, 2]}))
            .await
            .unwrap();
        let row = store
            .get_one(Collection::ChatSessions, &Filter::new().eq("id", id.as_str()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.data["messages"], json!([1, 2]));
        assert_eq!(row.data["user_id"], "u");
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let store = MemoryStore::new();
        let result = store
            .update(Collection::ChatSessions, &RecordId::generate(), json!({}))
            .await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn newest_first_ordering() {
        let store = MemoryStore::new();
        for n in 0..3 {
            store
                .insert(Collection::FoundAnimals, json!({ "n": n }))
                .await
                .unwrap();
        }
        let rows = store
            .query(
                Collection::FoundAnimals,
                &Filter::new(),
                Some(&Order::desc("created_at")),
            )
            .await
            .unwrap();
        let ns: Vec<_> = rows.iter().map(|r| r.data["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![2, 1, 0]);
    }
}
