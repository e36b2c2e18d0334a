//! In-memory context store.
//!
//! The store is a plain owned value. It performs no I/O and never
//! suspends, so a caller that guards it with a lock never holds the lock
//! across an await point.
//!
//! # Example
//!
//! ```rust
//! use ctxapi_core::store::{ContextPatch, ContextStore, NewContext};
//!
//! let mut store = ContextStore::seeded();
//! assert_eq!(store.len(), 4);
//!
//! let created = store.create(NewContext::titled("Rocky 9")).unwrap();
//! assert_eq!(created.id, 5);
//!
//! let patch = ContextPatch { done: Some(true), ..Default::default() };
//! let updated = store.update(created.id, &patch).unwrap();
//! assert!(updated.done);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// A single context record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRecord {
    /// Unique id, assigned on creation and never reused.
    pub id: u64,

    /// Title, never empty for records created through the store.
    pub title: String,

    /// Free-form description.
    pub description: String,

    /// Completion flag.
    pub done: bool,
}

/// Input for [`ContextStore::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContext {
    /// Required title. `None` and `""` are both rejected.
    pub title: Option<String>,

    /// Optional description, defaults to empty.
    pub description: Option<String>,
}

impl NewContext {
    /// Creates input with just a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update for [`ContextStore::update`].
///
/// Only fields that are `Some` overwrite the stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextPatch {
    /// New title.
    pub title: Option<String>,

    /// New description.
    pub description: Option<String>,

    /// New completion flag.
    pub done: Option<bool>,
}

impl ContextPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.done.is_none()
    }

    fn apply(&self, record: &mut ContextRecord) {
        if let Some(title) = &self.title {
            record.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            record.description.clone_from(description);
        }
        if let Some(done) = self.done {
            record.done = done;
        }
    }
}

/// Records present at process start.
const SEED: [(&str, &str); 4] = [
    ("Cento 6", "RHEL 6 based"),
    ("Centos 7", "RHEL 7 based"),
    ("Centos 8", "RHEL 8 based"),
    ("Centos stream", "Fedora + RHEL based"),
];

/// Ordered, in-memory collection of context records.
///
/// Ids come from a monotonic counter that is never rewound, so an id
/// retired by [`delete`](Self::delete) is never handed out again.
#[derive(Debug, Clone)]
pub struct ContextStore {
    records: Vec<ContextRecord>,
    next_id: u64,
}

impl ContextStore {
    /// Creates an empty store whose first id will be 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Creates a store holding the four startup records (ids 1 to 4).
    #[must_use]
    pub fn seeded() -> Self {
        let mut store = Self::new();
        for (title, description) in SEED {
            store.insert(title.to_string(), description.to_string());
        }
        store
    }

    /// Returns all records in insertion order.
    #[must_use]
    pub fn list(&self) -> &[ContextRecord] {
        &self.records
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the id the next created record will receive.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Looks up a record by id.
    pub fn get(&self, id: u64) -> ApiResult<&ContextRecord> {
        self.records
            .iter()
            .find(|record| record.id == id)
            .ok_or(ApiError::NotFound(id))
    }

    /// Creates a record with a fresh id.
    ///
    /// Fails with [`ApiError::Validation`] if the title is absent or empty.
    pub fn create(&mut self, input: NewContext) -> ApiResult<ContextRecord> {
        let title = match input.title {
            Some(title) if !title.is_empty() => title,
            _ => return Err(ApiError::bad_request()),
        };
        let description = input.description.unwrap_or_default();
        Ok(self.insert(title, description).clone())
    }

    /// Merges the supplied fields into an existing record.
    ///
    /// An empty patch is a no-op that returns the unchanged record.
    pub fn update(&mut self, id: u64, patch: &ContextPatch) -> ApiResult<ContextRecord> {
        let record = self
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(ApiError::NotFound(id))?;
        patch.apply(record);
        Ok(record.clone())
    }

    /// Removes a record. The id is retired.
    pub fn delete(&mut self, id: u64) -> ApiResult<bool> {
        let index = self
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or(ApiError::NotFound(id))?;
        self.records.remove(index);
        Ok(true)
    }

    fn insert(&mut self, title: String, description: String) -> &ContextRecord {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push(ContextRecord {
            id,
            title,
            description,
            done: false,
        });
        &self.records[self.records.len() - 1]
    }
}

impl Default for ContextStore {
    /// Same as [`ContextStore::seeded`].
    fn default() -> Self {
        Self::seeded()
    }
}
