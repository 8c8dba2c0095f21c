pub mod record;
pub mod request;
pub mod store;

pub use record::{ManagedRecord, RecordId};
pub use request::{FetchRequest, Predicate, SortKey};
pub use store::{RecordStore, StoreSchema};
