//! `RecordStore` trait: the persistence collaborator.
//!
//! Records are JSON objects grouped into collections. The store assigns each
//! record an id and a creation timestamp; everything else lives in `data`.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DatabaseError;

/// The collections this crate reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    FoundAnimals,
    FosterApplications,
    ChatSessions,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FoundAnimals => "found_animals",
            Self::FosterApplications => "foster_applications",
            Self::ChatSessions => "chat_sessions",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store-assigned record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub data: Value,
}

impl StoredRecord {
    /// Look up a top-level field. `id` and `created_at` resolve to the store columns.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.0.clone())),
            "created_at" => Some(Value::String(self.created_at.to_rfc3339())),
            _ => self.data.get(name).cloned(),
        }
    }
}

/// One filter condition on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
}

/// Conjunction of conditions. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.into(), value.into()));
        self
    }

    pub fn in_values<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.conditions.push(Condition::In(
            field.into(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn matches(&self, record: &StoredRecord) -> bool {
        self.conditions.iter().all(|cond| match cond {
            Condition::Eq(field, value) => record.field(field).as_ref() == Some(value),
            Condition::In(field, values) => record
                .field(field)
                .is_some_and(|actual| values.contains(&actual)),
        })
    }
}

/// Sort order for `query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub descending: bool,
}

impl Order {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Sort records in place. Ties keep insertion order for ascending sorts and
/// reverse it for descending ones, so "newest first" stays deterministic.
pub fn sort_records(records: &mut Vec<StoredRecord>, order: &Order) {
    let mut keyed: Vec<(usize, StoredRecord)> = records.drain(..).enumerate().collect();
    keyed.sort_by(|(ia, a), (ib, b)| {
        let ord = if order.field == "created_at" {
            a.created_at.cmp(&b.created_at)
        } else {
            compare_values(a.field(&order.field).as_ref(), b.field(&order.field).as_ref())
        }
        .then(ia.cmp(ib));
        if order.descending { ord.reverse() } else { ord }
    });
    records.extend(keyed.into_iter().map(|(_, r)| r));
}

/// Total order over optional JSON scalars: missing < null < bool < number < string.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Merge the top-level keys of `patch` into `data`.
pub fn apply_patch(data: &mut Value, patch: Value) -> Result<(), DatabaseError> {
    let (Some(target), Value::Object(fields)) = (data.as_object_mut(), patch) else {
        return Err(DatabaseError::Serialization(
            "records and patches must be JSON objects".to_string(),
        ));
    };
    for (key, value) in fields {
        target.insert(key, value);
    }
    Ok(())
}

/// Backend-agnostic persistence interface.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record (a JSON object). Returns the generated id.
    async fn insert(&self, collection: Collection, record: Value)
        -> Result<RecordId, DatabaseError>;

    /// Merge `patch` into the record with `id`.
    async fn update(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Value,
    ) -> Result<(), DatabaseError>;

    /// List records matching `filter`, optionally sorted.
    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<StoredRecord>, DatabaseError>;

    /// First record matching `filter`, if any.
    async fn get_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<StoredRecord>, DatabaseError> {
        Ok(self
            .query(collection, filter, None)
            .await?
            .into_iter()
            .next())
    }
}
