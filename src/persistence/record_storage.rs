use crate::core::{Result, Value};
use crate::persistence::{Persistable, PersistenceStorage, RecordDescriptor};
use crate::storage::{FetchRequest, Predicate, RecordStore, StoreSchema};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A [`PersistenceStorage`] implementation backed by a [`RecordStore`].
///
/// The store handle is a single-writer domain: every operation takes the one
/// async mutex, so writes serialize and a failed commit is fully rolled back
/// before the store is reused.
///
/// # Examples
///
/// ```
/// use clientstore::{RecordStorage, StoreSchema};
///
/// # fn main() -> clientstore::Result<()> {
/// let storage = RecordStorage::open(
///     StoreSchema::new().with_collection("repositories"),
/// )?;
/// # let _ = storage;
/// # Ok(())
/// # }
/// ```
pub struct RecordStorage {
    store: Arc<Mutex<RecordStore>>,
}

impl RecordStorage {
    /// Opens the backing record store.
    ///
    /// This is the one error the persistence subsystem propagates: without a
    /// store nothing else can run. Every operation after a successful open
    /// fails soft.
    pub fn open(schema: StoreSchema) -> Result<Self> {
        let store = RecordStore::open(schema)?;
        Ok(Self {
            store: Arc::new(Mutex::new(store)),
        })
    }

    /// Wraps an existing store, sharing the same single-writer domain.
    pub fn with_store(store: Arc<Mutex<RecordStore>>) -> Self {
        Self { store }
    }

    fn lookup_request<T>(descriptor: &RecordDescriptor<T>, id: &str) -> FetchRequest {
        FetchRequest::new(descriptor.entity_name)
            .filter(Predicate::equals(
                descriptor.identifier_key,
                Value::from(id),
            ))
            .limit(1)
    }
}

#[async_trait]
impl PersistenceStorage for RecordStorage {
    async fn fetch_by_id<T: Persistable>(&self, id: &str) -> Option<T> {
        let descriptor = T::record_descriptor()?;
        let store = self.store.lock().await;

        match store.execute(&Self::lookup_request(&descriptor, id)) {
            Ok(records) => records.first().and_then(|r| (descriptor.from_record)(r)),
            Err(err) => {
                warn!(entity = descriptor.entity_name, id, error = %err, "fetch_by_id failed");
                None
            }
        }
    }

    async fn fetch_all<T: Persistable>(&self) -> Vec<T> {
        let Some(descriptor) = T::record_descriptor() else {
            return Vec::new();
        };
        let store = self.store.lock().await;
        let request =
            FetchRequest::new(descriptor.entity_name).sorted_by(descriptor.sort_order.clone());

        match store.execute(&request) {
            Ok(records) => records
                .iter()
                .filter_map(|r| (descriptor.from_record)(r))
                .collect(),
            Err(err) => {
                warn!(entity = descriptor.entity_name, error = %err, "fetch_all failed");
                Vec::new()
            }
        }
    }

    async fn store<T: Persistable>(&self, entity: &T) {
        let Some(descriptor) = T::record_descriptor() else {
            debug!("store skipped: type has no record descriptor");
            return;
        };
        let mut store = self.store.lock().await;

        if let Err(err) = upsert(&mut store, &descriptor, entity) {
            store.rollback();
            warn!(
                entity = descriptor.entity_name,
                id = entity.persistence_id(),
                error = %err,
                "store failed, pending changes rolled back"
            );
        }
    }

    async fn remove<T: Persistable>(&self, id: &str) {
        let Some(descriptor) = T::record_descriptor() else {
            debug!("remove skipped: type has no record descriptor");
            return;
        };
        let mut store = self.store.lock().await;

        if let Err(err) = remove_by_id(&mut store, &descriptor, id) {
            store.rollback();
            warn!(
                entity = descriptor.entity_name,
                id,
                error = %err,
                "remove failed, pending changes rolled back"
            );
        }
    }
}

/// Upsert: reuse the record matching the identifier when one exists,
/// otherwise insert a new one, then project the entity onto it and commit
/// only if something actually changed.
fn upsert<T: Persistable>(
    store: &mut RecordStore,
    descriptor: &RecordDescriptor<T>,
    entity: &T,
) -> Result<()> {
    let request = RecordStorage::lookup_request(descriptor, entity.persistence_id());
    let existing = store.execute(&request)?.first().map(|r| r.id());

    let id = match existing {
        Some(id) => id,
        None => store.insert_new(descriptor.entity_name)?,
    };

    let record = store.record_mut(descriptor.entity_name, id)?;
    (descriptor.project_onto)(entity, record);

    commit_if_needed(store)
}

fn remove_by_id<T: Persistable>(
    store: &mut RecordStore,
    descriptor: &RecordDescriptor<T>,
    id: &str,
) -> Result<()> {
    let request = RecordStorage::lookup_request(descriptor, id);
    let Some(record_id) = store.execute(&request)?.first().map(|r| r.id()) else {
        return Ok(());
    };

    store.delete(descriptor.entity_name, record_id)?;
    commit_if_needed(store)
}

fn commit_if_needed(store: &mut RecordStore) -> Result<()> {
    if !store.has_changes() {
        return Ok(());
    }
    store.commit().inspect_err(|_| store.rollback())
}
