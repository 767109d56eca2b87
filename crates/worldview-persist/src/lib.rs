pub mod builder;
pub mod dbs;
pub mod error;
pub mod models;
pub mod trait_store;

pub use builder::{connect_store, StoreBackend, StoreConfig, ThreadStoreBuilder};
pub use dbs::file::FileThreadStore;
pub use dbs::memory::MemoryThreadStore;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoThreadStore;
pub use error::{PersistError, Result};
pub use models::ThreadRecord;
pub use trait_store::ThreadStore;
