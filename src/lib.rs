//! HAR replay server library.
//!
//! Serves recorded HTTP responses from an HTTP Archive to clients whose
//! requests have been rewritten to point at this server.

pub mod admin;
pub mod archive;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod replay;

pub use archive::{ArchiveSnapshot, ArchiveStore};
pub use config::ReplayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use replay::{ReplayEngine, ReplayOutcome, ReplayRequest};
