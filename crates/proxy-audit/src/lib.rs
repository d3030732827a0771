// Domain-driven module structure for proxy-audit.

// Core pipeline
pub mod record;
pub mod route;
pub mod filter;
pub mod pipeline;

// Persistence and concurrency
pub mod dispatch;
pub mod sink;

// Process plumbing
pub mod conf;
pub mod source;
pub mod state;
pub mod runtime;
