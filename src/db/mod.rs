mod backend;
pub mod sanitize;
mod sqlite;

pub use backend::{DocumentStore, SessionRecord};
pub use sqlite::SqliteBackend;
