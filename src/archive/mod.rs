//! Archive subsystem.
//!
//! # Data Flow
//! ```text
//! HAR file (JSON)
//!     → loader.rs (read & decode into model.rs types)
//!     → store.rs (validate pages, derive fallback origin)
//!     → index.rs ((url, method) → entries in capture order)
//!     → ArchiveSnapshot (immutable)
//!     → published via atomic swap to all request handlers
//!
//! On load request / file change:
//!     /loadHAR, admin reload or watcher.rs
//!     → loader.rs loads new archive
//!     → new snapshot built off to the side
//!     → atomic swap of Arc<ArchiveSnapshot>
//!     → failure leaves the previous snapshot in force
//! ```

pub mod error;
pub mod index;
pub mod loader;
pub mod model;
pub mod store;
pub mod watcher;

pub use error::ArchiveError;
pub use index::{ArchiveIndex, IndexKey};
pub use model::{Archive, Entry};
pub use store::{ArchiveSnapshot, ArchiveStore, ArchiveSummary};
pub use watcher::ArchiveWatcher;
