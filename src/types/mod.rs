mod document;
mod query;

pub use document::Document;
pub use query::{Filter, Query, SortOrder};
