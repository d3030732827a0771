//! Record module — normalizes raw input from either source into a [`RawRecord`].

pub mod model;
pub mod line;
pub mod message;

pub use model::{RawRecord, RecordError};
pub use message::{AgentMessage, MessageArg};
