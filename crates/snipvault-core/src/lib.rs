// Public fallible APIs in this crate share one concrete error contract (`SnipError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod config;
pub mod error;
pub mod fuzzy;
pub mod hierarchy;
pub mod models;
pub mod rank;
pub mod repo;
pub mod store;
pub mod transfer;

pub use config::RepositoryConfig;
pub use error::{Result, SnipError};
pub use models::{
    Origin, SnippetChanges, SnippetDraft, SnippetRecord, StoreMode, TagRecord, TagType,
};
pub use repo::SnippetRepository;
