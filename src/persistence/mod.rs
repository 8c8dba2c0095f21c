pub mod record_storage;

pub use record_storage::RecordStorage;

use crate::storage::{ManagedRecord, SortKey};
use async_trait::async_trait;

/// The minimal shape a model must expose to be eligible for persistence:
/// a caller-assigned identifier, stable for the entity's lifetime and unique
/// within the type's record space.
///
/// Types that can additionally be mapped onto a managed record override
/// [`record_descriptor`](Persistable::record_descriptor); the default `None`
/// keeps the type persistable in name only, and concrete storages treat it
/// as "not found" / no-op.
pub trait Persistable: Sized + Send + Sync + 'static {
    fn persistence_id(&self) -> &str;

    fn record_descriptor() -> Option<RecordDescriptor<Self>> {
        None
    }
}

/// Describes how a persistable type maps onto a record-store collection.
///
/// This replaces a runtime "does this type also support records?" check:
/// the capability is resolved per concrete type at compile time, and its
/// absence is the not-eligible condition.
pub struct RecordDescriptor<T> {
    pub entity_name: &'static str,
    pub identifier_key: &'static str,
    pub sort_order: Vec<SortKey>,
    pub from_record: fn(&ManagedRecord) -> Option<T>,
    pub project_onto: fn(&T, &mut ManagedRecord),
}

impl<T> RecordDescriptor<T> {
    pub fn new(
        entity_name: &'static str,
        identifier_key: &'static str,
        from_record: fn(&ManagedRecord) -> Option<T>,
        project_onto: fn(&T, &mut ManagedRecord),
    ) -> Self {
        Self {
            entity_name,
            identifier_key,
            sort_order: Vec::new(),
            from_record,
            project_onto,
        }
    }

    pub fn sorted_by(mut self, sort_order: Vec<SortKey>) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// The storage-agnostic persistence contract.
///
/// All four operations fail soft: backing-store errors are logged and
/// degraded to none/empty/no-op instead of surfacing to callers.
#[async_trait]
pub trait PersistenceStorage: Send + Sync {
    /// Returns the entity with the given identifier, if present.
    async fn fetch_by_id<T: Persistable>(&self, id: &str) -> Option<T>;

    /// Returns all entities of the type, in the type's declared sort order.
    async fn fetch_all<T: Persistable>(&self) -> Vec<T>;

    /// Upserts the entity: overwrites the record with its identifier if one
    /// exists, otherwise inserts a new one.
    async fn store<T: Persistable>(&self, entity: &T);

    /// Removes the entity with the given identifier; absent is a no-op.
    async fn remove<T: Persistable>(&self, id: &str);
}
