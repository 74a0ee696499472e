// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod diff;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod render;
pub mod scan;
pub mod store;
pub mod types;

// Notification batching & dispatch
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::error::{Result, WatchError};
pub use crate::fingerprint::{fingerprint, Fingerprint};
pub use crate::notify::NewItemsBatch;
pub use crate::scan::{CycleReport, ScanOutcome, Watcher};
pub use crate::types::{Audience, Recipient, Source};
