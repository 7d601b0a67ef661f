//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, extract method/path/Referer/Cookie)
//!     → replay engine (resolve origin, match, rebuild response)
//!     → response.rs (outcome → status, headers, body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, LoadHarRequest};
