//! Persistence layer for finalized interview responses.

pub mod json_files;
pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use json_files::JsonFileStore;
pub use libsql_backend::LibSqlStore;
pub use memory::MemoryStore;
pub use traits::ResponseStore;
