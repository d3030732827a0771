//! Dispatch module — the bounded worker pool shared by every source.

pub mod pool;

pub use pool::{DispatchError, DispatchHandle, DispatchSettings, Dispatcher, DrainReport};
