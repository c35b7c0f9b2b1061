//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - users, organizations, projects(org_id, code), project_members
//! - researchers
//! - research_notes(current_revision_id), note_revisions(rev_no, prev_hash, content_hash, chain_hash)
//! - note_files, note_folders, approvals(note_revision_id, step_no)
//! - data_updates, signature_state
//! - teams, admin_accounts, user_accounts

mod accounts;
mod notes;
mod organizations;
mod projects;
mod researchers;
pub mod schema;
pub mod sqlite;
mod workflow;

pub use sqlite::{SqliteStore, TableCount};
