//! Persistence capability: memory records, author/room connections, and the
//! stores that hold them (in-process and SQLite).

pub mod error;
pub mod record;
pub mod store;
pub mod store_sqlite;

pub use {
    error::{Error, Result},
    record::{ChannelType, Connection, MemoryContent, MemoryRecord},
    store::{InMemoryStore, MemoryStore, create_if_absent},
    store_sqlite::SqliteMemoryStore,
};
