// ============================================================================
// ClientStore Library
// ============================================================================
//
// Client-side persistence and resource caching:
// - a storage-agnostic persistence contract backed by an in-memory managed
//   record store with upsert, predicates, and commit/rollback
// - a count- and cost-bounded byte cache
// - an async, cancellation-aware resource loader publishing observable phases

pub mod cache;
pub mod core;
pub mod loader;
pub mod persistence;
pub mod settings;
pub mod storage;

// Re-export main types for convenience
pub use cache::{ByteCache, ByteCaching, CacheConfig};
pub use core::{Result, StoreError, Value};
pub use loader::{DecodeResource, HttpTransport, LoaderPhase, ResourceLoader, ResourceTransport};
pub use persistence::{Persistable, PersistenceStorage, RecordDescriptor, RecordStorage};
pub use settings::{SettingsKey, SettingsStore};
pub use storage::{FetchRequest, ManagedRecord, Predicate, RecordStore, SortKey, StoreSchema};

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: String,
        body: String,
    }

    impl Persistable for Note {
        fn persistence_id(&self) -> &str {
            &self.id
        }

        fn record_descriptor() -> Option<RecordDescriptor<Self>> {
            Some(RecordDescriptor::new(
                "notes",
                "id",
                |record| {
                    Some(Note {
                        id: record.text("id")?.to_string(),
                        body: record.text("body")?.to_string(),
                    })
                },
                |note, record| {
                    record.set("id", note.id.as_str());
                    record.set("body", note.body.as_str());
                },
            ))
        }
    }

    #[tokio::test]
    async fn test_store_and_fetch_round_trip() {
        let storage = RecordStorage::open(StoreSchema::new().with_collection("notes")).unwrap();

        let note = Note {
            id: "n1".to_string(),
            body: "hello".to_string(),
        };
        storage.store(&note).await;

        let fetched: Option<Note> = storage.fetch_by_id("n1").await;
        assert_eq!(fetched, Some(note));
    }

    #[tokio::test]
    async fn test_cache_limits_hold() {
        let cache = ByteCache::new(CacheConfig {
            count_limit: 2,
            total_cost_limit: 10,
        });
        cache.insert("a", vec![0; 4]);
        cache.insert("b", vec![0; 4]);
        cache.insert("c", vec![0; 4]);

        assert!(cache.len() <= 2);
        assert!(cache.total_cost() <= 10);
    }
}
