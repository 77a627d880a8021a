pub mod connection;
pub mod mappers;
pub mod rows;
pub mod sqlite_store;

pub use connection::{Database, DbPool};
pub use sqlite_store::SqliteLocalStore;
