//! # ProjectNote - research data management backend
//!
//! ProjectNote keeps organizations, projects, researchers and research notes
//! in SQLite and serves them over a JSON API plus a set of server-rendered
//! workflow pages.
//!
//! ProjectNote provides:
//! - Hash-chained note revisions (`chain_hash[n] = H(chain_hash[n-1] ":" H(content[n]))`)
//! - Chain verification for any note
//! - Session login for the workflow and admin pages
//! - Demo data seeding and row statistics from the CLI

pub mod auth;
pub mod chain;
pub mod config;
pub mod model;
pub mod seed;
pub mod server;
pub mod storage;
pub mod ui;
pub mod validate;

// Re-exports for convenient access
pub use chain::{ChainReport, build_chain_hash, sha256_hex};
pub use config::ProjectNoteConfig;
pub use storage::SqliteStore;
pub use validate::FieldIssue;

/// Result type alias for ProjectNote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ProjectNote operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldIssue>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(what: &str) -> Self {
        Error::NotFound(format!("{what} not found"))
    }
}

fn summarize(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.loc.join("."), issue.msg))
        .collect::<Vec<_>>()
        .join("; ")
}
