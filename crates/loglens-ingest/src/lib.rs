// Decoding and classification of raw session records.
//
// One line of a session file becomes a RawRow (tolerant, schema-on-read),
// and the classifier turns rows into visible timeline events or explicit
// drops. Raw logs stay the source of truth; nothing here persists state.

pub mod classify;
pub mod discovery;
pub mod error;
pub mod reader;
pub mod schema;

pub use classify::{
    Classification, ClassifiedEvent, Classifier, ClassifierConfig, DropReason, RowContext,
};
pub use discovery::{DiscoveredFile, default_log_roots, detect_source, scan_root};
pub use error::{Error, Result};
pub use reader::{ReadOutcome, SessionHeader, read_events, read_header};
pub use schema::{RawRow, decode_line};
