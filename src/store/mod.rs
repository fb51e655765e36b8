//! Persistence layer: the record store collaborator and its backends.

pub mod libsql_backend;
pub mod memory;
mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use memory::MemoryStore;
pub use traits::{Collection, Condition, Filter, Order, RecordId, RecordStore, StoredRecord};
