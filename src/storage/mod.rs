pub mod file_store;
pub mod sites;
pub mod traits;

pub use file_store::JsonFileStore;
pub use sites::{insert_at_head, InsertOutcome, SiteRecord, SiteRepository, MAX_SITES, SITES_KEY};
pub use traits::{KeyValueStore, MemoryStore, StorageChange};
