//! uprtcl: Content-Addressed Version Control
//!
//! Commits, perspectives (named mutable heads) and contexts over an eventually-consistent
//! replicated store, with three-way merging and a single-flight local cache.

pub mod api;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod commit;
pub mod config;
pub mod consistency;
pub mod content;
pub mod context;
pub mod draft;
pub mod entry;
pub mod error;
pub mod logging;
pub mod merge;
pub mod perspective;
pub mod provenance;
pub mod store;
pub mod types;

pub use api::VersionControlApi;
pub use error::{StorageError, VcError};
pub use types::{Address, Timestamp};
