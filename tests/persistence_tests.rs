/// Persistence facade tests
///
/// Covers upsert idempotence, removal, round trips, sort order, and the
/// not-eligible degradation path of the record storage adapter.
/// Run with: cargo test --test persistence_tests
use clientstore::{
    Persistable, PersistenceStorage, RecordDescriptor, RecordStorage, SortKey, StoreSchema,
};

#[derive(Debug, Clone, PartialEq)]
struct Repository {
    id: String,
    name: String,
    stars: i64,
}

impl Persistable for Repository {
    fn persistence_id(&self) -> &str {
        &self.id
    }

    fn record_descriptor() -> Option<RecordDescriptor<Self>> {
        Some(
            RecordDescriptor::new(
                "repositories",
                "id",
                |record| {
                    Some(Repository {
                        id: record.text("id")?.to_string(),
                        name: record.text("name")?.to_string(),
                        stars: record.integer("stars")?,
                    })
                },
                |repo, record| {
                    record.set("id", repo.id.as_str());
                    record.set("name", repo.name.as_str());
                    record.set("stars", repo.stars);
                },
            )
            .sorted_by(vec![SortKey::descending("stars")]),
        )
    }
}

/// Persistable in name only: no record descriptor.
#[derive(Debug, Clone, PartialEq)]
struct Draft {
    id: String,
}

impl Persistable for Draft {
    fn persistence_id(&self) -> &str {
        &self.id
    }
}

fn repo(id: &str, name: &str, stars: i64) -> Repository {
    Repository {
        id: id.to_string(),
        name: name.to_string(),
        stars,
    }
}

fn storage() -> RecordStorage {
    RecordStorage::open(StoreSchema::new().with_collection("repositories")).unwrap()
}

#[tokio::test]
async fn test_round_trip() {
    let storage = storage();
    let original = repo("octo/hello", "hello", 42);

    storage.store(&original).await;
    let fetched: Option<Repository> = storage.fetch_by_id("octo/hello").await;

    assert_eq!(fetched, Some(original));
}

#[tokio::test]
async fn test_fetch_missing_returns_none() {
    let storage = storage();
    let fetched: Option<Repository> = storage.fetch_by_id("nope").await;
    assert!(fetched.is_none());
}

#[tokio::test]
async fn test_store_twice_upserts() {
    let storage = storage();

    storage.store(&repo("octo/hello", "hello", 1)).await;
    storage.store(&repo("octo/hello", "hello-renamed", 99)).await;

    let all: Vec<Repository> = storage.fetch_all().await;
    assert_eq!(all.len(), 1, "upsert must never duplicate an identifier");
    assert_eq!(all[0].name, "hello-renamed");
    assert_eq!(all[0].stars, 99);
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let storage = storage();
    storage.store(&repo("octo/hello", "hello", 1)).await;

    storage.remove::<Repository>("octo/hello").await;
    storage.remove::<Repository>("octo/hello").await;
    storage.remove::<Repository>("never-stored").await;

    let all: Vec<Repository> = storage.fetch_all().await;
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_fetch_all_applies_declared_sort_order() {
    let storage = storage();
    storage.store(&repo("a", "small", 5)).await;
    storage.store(&repo("b", "big", 500)).await;
    storage.store(&repo("c", "mid", 50)).await;

    let all: Vec<Repository> = storage.fetch_all().await;
    let stars: Vec<i64> = all.iter().map(|r| r.stars).collect();
    assert_eq!(stars, vec![500, 50, 5]);
}

#[tokio::test]
async fn test_type_without_descriptor_degrades() {
    let storage = storage();

    // Writes are silently skipped, reads come back empty.
    storage.store(&Draft { id: "d1".to_string() }).await;
    storage.remove::<Draft>("d1").await;

    let fetched: Option<Draft> = storage.fetch_by_id("d1").await;
    assert!(fetched.is_none());
    let all: Vec<Draft> = storage.fetch_all().await;
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_unknown_collection_fails_soft() {
    // Store opened without the entity's collection: every operation
    // degrades instead of erroring.
    let storage = RecordStorage::open(StoreSchema::new().with_collection("other")).unwrap();

    storage.store(&repo("octo/hello", "hello", 1)).await;
    let fetched: Option<Repository> = storage.fetch_by_id("octo/hello").await;
    assert!(fetched.is_none());
    let all: Vec<Repository> = storage.fetch_all().await;
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_adapters_sharing_one_store_see_each_other() {
    use clientstore::RecordStore;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    let store = Arc::new(Mutex::new(
        RecordStore::open(StoreSchema::new().with_collection("repositories")).unwrap(),
    ));
    let writer = RecordStorage::with_store(store.clone());
    let reader = RecordStorage::with_store(store);

    writer.store(&repo("octo/hello", "hello", 7)).await;

    // Both adapters funnel through the same single-writer domain, so the
    // write is immediately visible to the other handle.
    let fetched: Option<Repository> = reader.fetch_by_id("octo/hello").await;
    assert_eq!(fetched, Some(repo("octo/hello", "hello", 7)));

    reader.remove::<Repository>("octo/hello").await;
    let all: Vec<Repository> = writer.fetch_all().await;
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_concurrent_stores_serialize() {
    let storage = std::sync::Arc::new(storage());

    let mut handles = Vec::new();
    for i in 0..16i64 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            storage.store(&repo(&format!("r{}", i), "repo", i)).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let all: Vec<Repository> = storage.fetch_all().await;
    assert_eq!(all.len(), 16);
}
