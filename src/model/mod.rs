//! Entity types
//!
//! Rows as the storage layer returns them, plus the create payloads the API
//! accepts. Payloads validate themselves with [`crate::validate::Checker`].

pub mod account;
pub mod note;
pub mod organization;
pub mod project;
pub mod researcher;
pub mod workflow;

pub use account::{
    AccountRole, AccountSummary, AdminAccount, NewAdmin, Registration, Signup, Team, UserProfile,
};
pub use note::{
    Approval, ApprovalDecision, ApprovalStatus, NewApproval, NewNote, NewNoteFile, NewNoteFolder,
    NewRevision, NoteCard, NoteFile, NoteFolder, NoteRevision, NoteUpdate, ResearchNote,
};
pub use organization::{NewOrganization, NewUser, Organization, User};
pub use project::{InvitedMember, NewProject, Project, ProjectDraft, ProjectForm, ProjectStatus};
pub use researcher::{GroupMember, NewResearcher, Researcher, ResearcherGroup};
pub use workflow::{DashboardSummary, DataUpdate, SignatureState};

/// Placeholder used for free-text fields a form left out.
pub const UNASSIGNED: &str = "Unassigned";
