pub mod message;
pub mod preview;
pub mod session;
