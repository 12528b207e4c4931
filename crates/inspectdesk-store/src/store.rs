//! Ordered in-memory record collections.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use inspectdesk_core::{FieldMap, Record, RecordId, Stored};
use serde_json::Value;
use tracing::{debug, info};

use crate::StoreError;

/// Highest id handed out or observed in this process.
static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Mint a process-unique id from the current time in milliseconds.
///
/// Ids are strictly increasing: two creates in the same millisecond get
/// consecutive values.
pub fn next_id() -> RecordId {
    let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(last.saturating_add(1));
        match LAST_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return RecordId::from(next),
            Err(actual) => last = actual,
        }
    }
}

/// Keep minted ids clear of numeric ids that arrived from elsewhere.
fn observe(id: &RecordId) {
    if let Some(n) = id.as_u64() {
        LAST_ID.fetch_max(n, Ordering::Relaxed);
    }
}

/// One collection of records, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStore<T> {
    records: Vec<Stored<T>>,
}

impl<T> Default for RecordStore<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T: Record> RecordStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record under a fresh id and creation time.
    pub fn create(&mut self, record: T) -> RecordId {
        let id = next_id();
        self.records.push(Stored::new(id.clone(), record));
        debug!(kind = %T::KIND, id = %id, "created record");
        id
    }

    /// Merge `fields` into the record, keeping `id`, `created_at` and the
    /// type's frozen fields.
    ///
    /// The merged record is decoded before anything is written, so a failed
    /// update leaves the store as it was.
    pub fn update(&mut self, id: &RecordId, fields: FieldMap) -> Result<&Stored<T>, StoreError> {
        let idx = self.position(id)?;
        let stored = &self.records[idx];
        let mut merged = match serde_json::to_value(&stored.record) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(StoreError::Other(format!("{} is not an object", T::KIND))),
            Err(source) => return Err(self.patch_error(id, source)),
        };
        for (key, value) in fields {
            if key == "id" || key == "created_at" || T::FROZEN.contains(&key.as_str()) {
                continue;
            }
            merged.insert(key, value);
        }
        let record: T = serde_json::from_value(Value::Object(merged))
            .map_err(|source| self.patch_error(id, source))?;
        self.records[idx].record = record;
        debug!(kind = %T::KIND, id = %id, "updated record");
        Ok(&self.records[idx])
    }

    /// Overwrite the editable fields of a record with those of `record`.
    pub fn replace(&mut self, id: &RecordId, record: &T) -> Result<&Stored<T>, StoreError> {
        let fields = match serde_json::to_value(record) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(StoreError::Other(format!("{} is not an object", T::KIND))),
            Err(source) => return Err(self.patch_error(id, source)),
        };
        self.update(id, fields)
    }

    /// Remove a record. Nothing else in the store is touched.
    pub fn delete(&mut self, id: &RecordId) -> Result<Stored<T>, StoreError> {
        let idx = self.position(id)?;
        let removed = self.records.remove(idx);
        debug!(kind = %T::KIND, id = %id, "deleted record");
        Ok(removed)
    }

    pub fn find_by_id(&self, id: &RecordId) -> Option<&Stored<T>> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn list(&self) -> &[Stored<T>] {
        &self.records
    }

    pub fn filter(&self, predicate: impl Fn(&Stored<T>) -> bool) -> Vec<&Stored<T>> {
        self.records.iter().filter(|r| predicate(r)).collect()
    }

    /// Swap the whole collection for records read from the server.
    pub fn replace_all(&mut self, records: Vec<Stored<T>>) {
        self.records.clear();
        self.ingest(records);
    }

    /// Append records that already carry ids.
    pub fn ingest(&mut self, records: Vec<Stored<T>>) -> usize {
        let count = records.len();
        for stored in &records {
            observe(&stored.id);
        }
        self.records.extend(records);
        info!(kind = %T::KIND, count, total = self.records.len(), "ingested records");
        count
    }

    /// Append several new records, each under a fresh id.
    pub fn append_many(&mut self, records: Vec<T>) -> Vec<RecordId> {
        let ids: Vec<RecordId> = records.into_iter().map(|r| self.create(r)).collect();
        info!(kind = %T::KIND, count = ids.len(), "appended records");
        ids
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &RecordId) -> Result<usize, StoreError> {
        self.records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound {
                kind: T::KIND,
                id: id.clone(),
            })
    }

    fn patch_error(&self, id: &RecordId, source: serde_json::Error) -> StoreError {
        StoreError::Patch {
            kind: T::KIND,
            id: id.clone(),
            source,
        }
    }
}
