use crate::core::{Result, StoreError};
use crate::storage::record::{ManagedRecord, RecordId};
use crate::storage::request::FetchRequest;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

/// Declares the collections a record store is opened with.
#[derive(Debug, Clone, Default)]
pub struct StoreSchema {
    collections: Vec<String>,
}

impl StoreSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collections.push(name.into());
        self
    }

    pub fn collections(&self) -> &[String] {
        &self.collections
    }
}

#[derive(Debug, Default)]
struct Collection {
    records: BTreeMap<RecordId, ManagedRecord>,
}

/// Uncommitted edits layered over the committed state.
///
/// Reads within the store see through this overlay, so a caller that inserts
/// a record observes it before commit, exactly like a managed view context.
#[derive(Debug, Default)]
struct PendingChanges {
    /// New records plus copy-on-write versions of updated committed records.
    written: BTreeMap<RecordId, ManagedRecord>,
    /// Committed records marked for deletion, keyed by id with their collection.
    deleted: BTreeMap<RecordId, String>,
}

impl PendingChanges {
    fn is_empty(&self) -> bool {
        self.written.is_empty() && self.deleted.is_empty()
    }

    fn clear(&mut self) {
        self.written.clear();
        self.deleted.clear();
    }
}

/// An in-memory managed record store.
///
/// The store is a single-writer domain: all access is expected to be
/// serialized by the owner (the persistence adapter wraps it in one async
/// mutex). Edits accumulate in a pending overlay until [`commit`] applies
/// them atomically; [`rollback`] discards them without touching committed
/// state.
///
/// [`commit`]: RecordStore::commit
/// [`rollback`]: RecordStore::rollback
#[derive(Debug)]
pub struct RecordStore {
    collections: HashMap<String, Collection>,
    pending: PendingChanges,
    next_record_id: RecordId,
}

impl RecordStore {
    /// Opens a store with the given schema.
    ///
    /// This is the one fatal failure point of the persistence subsystem:
    /// callers may propagate the error, everything downstream fails soft.
    pub fn open(schema: StoreSchema) -> Result<Self> {
        let mut collections = HashMap::new();
        for name in schema.collections() {
            if collections.contains_key(name) {
                return Err(StoreError::CollectionExists(name.clone()));
            }
            collections.insert(name.clone(), Collection::default());
        }
        Ok(Self {
            collections,
            pending: PendingChanges::default(),
            next_record_id: 0,
        })
    }

    /// Runs a fetch request, reading through the pending overlay.
    pub fn execute(&self, request: &FetchRequest) -> Result<Vec<ManagedRecord>> {
        let collection = self
            .collections
            .get(request.collection())
            .ok_or_else(|| StoreError::CollectionNotFound(request.collection().to_string()))?;

        let mut matches = Vec::new();
        for (id, committed) in &collection.records {
            if self.pending.deleted.contains_key(id) {
                continue;
            }
            let visible = self.pending.written.get(id).unwrap_or(committed);
            if request.matches(visible) {
                matches.push(visible.clone());
            }
        }
        for record in self.pending.written.values() {
            if record.collection() != request.collection() {
                continue;
            }
            if collection.records.contains_key(&record.id()) {
                continue; // already considered above
            }
            if request.matches(record) {
                matches.push(record.clone());
            }
        }

        request.apply_order_and_limit(&mut matches);
        Ok(matches)
    }

    /// Allocates a new pending record in the target collection.
    pub fn insert_new(&mut self, collection: &str) -> Result<RecordId> {
        if !self.collections.contains_key(collection) {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }
        let id = self.next_record_id;
        self.next_record_id += 1;
        self.pending
            .written
            .insert(id, ManagedRecord::new(id, collection));
        Ok(id)
    }

    /// Mutable access to a record, copying it into the pending overlay when
    /// it only exists in committed state.
    pub fn record_mut(&mut self, collection: &str, id: RecordId) -> Result<&mut ManagedRecord> {
        if self.pending.deleted.contains_key(&id) {
            return Err(StoreError::RecordNotFound(id));
        }
        match self.pending.written.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let committed = self
                    .collections
                    .get(collection)
                    .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?
                    .records
                    .get(&id)
                    .ok_or(StoreError::RecordNotFound(id))?
                    .clone();
                Ok(entry.insert(committed))
            }
        }
    }

    /// Marks a record for deletion. Deleting a record that was never
    /// committed simply drops its pending insert.
    pub fn delete(&mut self, collection: &str, id: RecordId) -> Result<()> {
        if !self.collections.contains_key(collection) {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }
        self.pending.written.remove(&id);
        if self
            .collections
            .get(collection)
            .is_some_and(|c| c.records.contains_key(&id))
        {
            self.pending.deleted.insert(id, collection.to_string());
        }
        Ok(())
    }

    pub fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Applies all pending changes to committed state.
    ///
    /// Validation runs before any mutation so a failed commit leaves the
    /// committed state untouched; the caller is expected to [`rollback`]
    /// before reusing the store.
    ///
    /// [`rollback`]: RecordStore::rollback
    pub fn commit(&mut self) -> Result<()> {
        for record in self.pending.written.values() {
            if !self.collections.contains_key(record.collection()) {
                return Err(StoreError::CommitFailure(format!(
                    "pending record {} targets unknown collection '{}'",
                    record.id(),
                    record.collection()
                )));
            }
        }
        for collection in self.pending.deleted.values() {
            if !self.collections.contains_key(collection) {
                return Err(StoreError::CommitFailure(format!(
                    "pending delete targets unknown collection '{}'",
                    collection
                )));
            }
        }

        let written = std::mem::take(&mut self.pending.written);
        let deleted = std::mem::take(&mut self.pending.deleted);
        for (id, collection) in deleted {
            if let Some(target) = self.collections.get_mut(&collection) {
                target.records.remove(&id);
            }
        }
        for (id, record) in written {
            if let Some(target) = self.collections.get_mut(record.collection()) {
                target.records.insert(id, record);
            }
        }
        Ok(())
    }

    /// Discards all pending changes.
    pub fn rollback(&mut self) {
        self.pending.clear();
    }

    /// Number of committed records in a collection.
    pub fn record_count(&self, collection: &str) -> Result<usize> {
        self.collections
            .get(collection)
            .map(|c| c.records.len())
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }
}
