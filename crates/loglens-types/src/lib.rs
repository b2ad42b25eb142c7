pub mod error;
pub mod event;
pub mod session;
pub mod source;
mod util;

pub use error::{Error, Result};
pub use event::*;
pub use session::*;
pub use source::SourceKind;
pub use util::*;
