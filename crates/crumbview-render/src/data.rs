//! Record loading for the data-loader directive.
//!
//! A loader node describes a [`FetchRequest`]. Render passes only read the
//! [`DataCache`]; fetching happens in [`Renderer::settle`], after which the
//! host renders again and the loader's children see the records.
//!
//! [`Renderer::settle`]: crate::Renderer::settle

use crate::error::StoreError;
use async_trait::async_trait;
use crumbview_types::{Record, RecordQuery, Value};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ══════════════════════════════════════════════════════════════════════════
// Store client
// ══════════════════════════════════════════════════════════════════════════

/// The record store collaborator.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn fetch_by_id(&self, id: &str) -> Result<Record, StoreError>;
    async fn search(&self, query: &RecordQuery) -> Result<Vec<Record>, StoreError>;
}

/// Fetch a target and convert the result to a context value: a single
/// record for an id, a list for a query.
pub async fn fetch(store: &dyn StoreClient, target: &FetchTarget) -> Result<Value, StoreError> {
    match target {
        FetchTarget::Id(id) => store.fetch_by_id(id).await.map(|r| r.to_value()),
        FetchTarget::Query(query) => store
            .search(query)
            .await
            .map(|records| Value::List(records.iter().map(Record::to_value).collect())),
    }
}

/// A [`StoreClient`] over records held in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<Record>>,
}

impl InMemoryStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Insert a record, replacing any record with the same id and bumping
    /// its version.
    pub fn upsert(&self, mut record: Record) {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                record.version = existing.version + 1;
                *existing = record;
            }
            None => records.push(record),
        }
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id != id);
        records.len() != before
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn fetch_by_id(&self, id: &str) -> Result<Record, StoreError> {
        self.records
            .read()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn search(&self, query: &RecordQuery) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| query.matches(r))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Requests
// ══════════════════════════════════════════════════════════════════════════

/// What a loader asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchTarget {
    Id(String),
    Query(RecordQuery),
}

/// A fetch with the cache key derived from its own target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub target: FetchTarget,
    pub key: String,
}

impl FetchRequest {
    pub fn new(target: FetchTarget) -> Self {
        let key = serde_json::to_string(&target).unwrap_or_else(|_| format!("{target:?}"));
        Self { target, key }
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new(FetchTarget::Id(id.into()))
    }

    pub fn query(query: RecordQuery) -> Self {
        Self::new(FetchTarget::Query(query))
    }

    /// Build a request from a loader's resolved props.
    ///
    /// `id` selects a single record. Otherwise the query comes from a
    /// `query` record, or from `tag`/`schema_name`/`any_tags`/`all_tags`/
    /// `limit` given directly on the props. A missing `limit` becomes
    /// `default_limit`.
    pub fn from_props(
        props: &BTreeMap<String, Value>,
        default_limit: usize,
    ) -> Result<Self, String> {
        if let Some(id) = props.get("id") {
            return match id {
                Value::String(s) if !s.is_empty() => Ok(Self::by_id(s.clone())),
                Value::Number(_) => Ok(Self::by_id(id.to_display_string())),
                other => Err(format!(
                    "record id resolved to {} instead of a string",
                    other.type_name()
                )),
            };
        }

        let fields: BTreeMap<String, Value> = match props.get("query") {
            Some(Value::Record(q)) => q.clone(),
            Some(other) => {
                return Err(format!(
                    "query must be a record, got {}",
                    other.type_name()
                ))
            }
            None => props
                .iter()
                .filter(|(k, _)| QUERY_FIELDS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        let fields: BTreeMap<String, Value> = fields
            .into_iter()
            .filter(|(_, v)| !v.is_nullish())
            .collect();
        let has_limit = fields.contains_key("limit");
        let json = Value::Record(fields).to_json();
        let mut query: RecordQuery =
            serde_json::from_value(json).map_err(|e| format!("invalid query: {e}"))?;
        if !has_limit {
            query.limit = default_limit;
        }
        Ok(Self::query(query))
    }
}

const QUERY_FIELDS: &[&str] = &["tag", "schema_name", "schema", "any_tags", "all_tags", "limit"];

// ══════════════════════════════════════════════════════════════════════════
// Cache
// ══════════════════════════════════════════════════════════════════════════

/// Per-request fetch state.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    InFlight,
    Ready(Value),
    Failed(String),
}

/// Fetch results keyed by [`FetchRequest::key`].
#[derive(Debug, Default)]
pub struct DataCache {
    entries: Mutex<HashMap<String, FetchState>>,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<FetchState> {
        self.entries.lock().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, state: FetchState) {
        self.entries.lock().insert(key.into(), state);
    }

    /// Mark `key` in flight unless it already has an entry. Returns `true`
    /// if the caller should fetch it.
    pub fn claim(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains_key(key) {
            false
        } else {
            entries.insert(key.to_string(), FetchState::InFlight);
            true
        }
    }

    /// Claim every key not yet cached. The returned guard releases any of
    /// them still in flight when dropped, so a settle that is cancelled
    /// before it finishes leaves nothing behind.
    pub fn claim_all<'c>(&'c self, requests: Vec<FetchRequest>) -> ClaimGuard<'c> {
        let claimed = requests.into_iter().filter(|r| self.claim(&r.key)).collect();
        ClaimGuard {
            cache: self,
            claimed,
        }
    }

    /// Drop `key` only if it is still in flight.
    pub fn release(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        if matches!(entries.get(key), Some(FetchState::InFlight)) {
            entries.remove(key);
            true
        } else {
            false
        }
    }

    pub fn remove(&self, key: &str) -> Option<FetchState> {
        self.entries.lock().remove(key)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Requests claimed by one settle. Dropping the guard releases every key
/// that has not been given a result.
#[derive(Debug)]
pub struct ClaimGuard<'c> {
    cache: &'c DataCache,
    claimed: Vec<FetchRequest>,
}

impl ClaimGuard<'_> {
    pub fn requests(&self) -> &[FetchRequest] {
        &self.claimed
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        for request in &self.claimed {
            if self.cache.release(&request.key) {
                tracing::debug!(key = %request.key, "released unsettled claim");
            }
        }
    }
}
