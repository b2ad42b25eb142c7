// SQLite index store
// Persists sessions, search messages, and timeline previews; raw logs stay
// the source of truth for full timelines.

mod db;
mod error;
mod queries;
mod records;
mod schema;

// Public API
pub use db::Database;
pub use error::{Error, Result};
pub use records::{MessageHit, SessionFilter};
pub use schema::SCHEMA_VERSION;
