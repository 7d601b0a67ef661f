//! Matching and replay engine.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path+query, Referer, Cookie)
//!     → origin.rs (recover origin, or decide to redirect)
//!     → full URL = origin + stripped path/query
//!     → matcher.rs (index lookup → cookie narrowing → method tie-break)
//!     → replayer.rs (status, allow-listed headers, decoded body)
//!     → ReplayOutcome
//! ```
//!
//! # Design Decisions
//! - Pure functions over an immutable snapshot; no I/O on the request path
//! - Not-found is a routine outcome, not an error
//! - A broken entry fails only the request that matched it

pub mod cookies;
pub mod engine;
pub mod matcher;
pub mod origin;
pub mod replayer;

pub use cookies::CookieSet;
pub use engine::{replay_request, ReplayEngine, ReplayOutcome, ReplayRequest};
pub use origin::{resolve, Resolution};
pub use replayer::{replay, ReplayError, ReplayedResponse};
