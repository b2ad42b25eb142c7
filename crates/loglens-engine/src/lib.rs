// NOTE: Engine Architecture Rationale
//
// Why pointer-based (the store never copies timelines)?
// - Source tools rewrite their formats without notice; keeping raw logs as
//   the source of truth means improved classification applies on the next
//   read instead of requiring a migration
// - A session's index entry is cheap to rebuild, so failure recovery is
//   "reset to unparsed and re-read"
//
// Why a parse-level state machine?
// - Listing ~2k sessions must not read ~2k full files; metadata level
//   needs only a bounded header scan
// - Levels only advance while a file is unchanged, so repeated index runs
//   are cheap no-ops
//
// Why synchronous core + thread-pool queue?
// - Classification is pure and CPU-bound; indexing is file-bound. Neither
//   needs an async runtime, and callers that have one can wrap the engine
//   in their own tasks.

mod engine;
mod error;
mod fsmeta;
mod queue;
mod search;
mod timeline;
mod watcher;

pub use engine::{Engine, IndexProgress, IndexSummary};
pub use error::{Error, Result};
pub use fsmeta::{FileMeta, FileStat, SystemFileMeta};
pub use queue::{IndexJob, IndexQueue, QueueHandle};
pub use search::{RankedMessage, SearchOptions};
pub use watcher::WatchService;
