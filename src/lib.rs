//! vgs-server library
//!
//! A per-user audio catalog with a ratings ledger, served over HTTP.
//! The modules are exposed for the binaries and the end-to-end tests.

pub mod catalog;
pub mod cli_style;
pub mod config;
pub mod library;
pub mod ratings;
pub mod server;
pub mod user;

// Re-export commonly used types for convenience
pub use catalog::{Catalog, TrackId};
pub use library::Library;
pub use server::{run_server, RequestsLoggingLevel};
pub use user::{FileUserStore, UserStore};
