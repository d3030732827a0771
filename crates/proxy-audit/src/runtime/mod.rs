//! Runtime module — process lifecycle: logging, boot, serve, shutdown.

pub mod boot;
pub mod logging;
pub mod report;
pub mod serve;
pub mod stop;
