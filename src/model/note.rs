//! Research notes, their revisions, attachments and approvals

use crate::validate::Checker;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResearchNote {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub title: String,
    pub entry_date: Option<NaiveDate>,
    pub owner: String,
    pub period: String,
    pub summary: String,
    pub created_by: Option<Uuid>,
    /// Newest revision; set in the same transaction that writes it
    pub current_revision_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One immutable link of a note's hash chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteRevision {
    pub id: Uuid,
    pub note_id: Uuid,
    pub rev_no: u32,
    pub content_md: String,
    pub content_json: Value,
    pub prev_hash: Option<String>,
    pub content_hash: String,
    pub chain_hash: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNote {
    pub project_id: Uuid,
    pub title: String,
    pub entry_date: NaiveDate,
    pub content_md: String,
    pub content_json: Value,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl NewNote {
    pub fn validate(&self) -> Result<()> {
        let mut checker = Checker::body();
        checker
            .length("title", &self.title, 1, 255)
            .min_length("content_md", &self.content_md, 1)
            .json_object("content_json", &self.content_json);
        checker.finish()
    }

    /// The revision-1 payload carried by this note.
    pub fn baseline(&self) -> NewRevision {
        NewRevision {
            content_md: self.content_md.clone(),
            content_json: self.content_json.clone(),
            created_by: self.created_by,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRevision {
    pub content_md: String,
    pub content_json: Value,
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

impl NewRevision {
    pub fn validate(&self) -> Result<()> {
        let mut checker = Checker::body();
        checker
            .min_length("content_md", &self.content_md, 1)
            .json_object("content_json", &self.content_json);
        checker.finish()
    }
}

/// Title/summary edit from the workflow screens. Blank values are ignored.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
}

impl NoteUpdate {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Denormalized note row for list and detail screens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteCard {
    pub id: Uuid,
    pub title: String,
    pub owner: String,
    pub project_id: Option<Uuid>,
    pub project_code: String,
    pub period: String,
    pub files: u32,
    pub members: u32,
    pub summary: String,
    pub current_rev_no: Option<u32>,
    pub last_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteFile {
    pub id: i64,
    pub note_id: Uuid,
    pub note_revision_id: Option<Uuid>,
    pub name: String,
    pub author: String,
    pub format: String,
    pub created: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteFolder {
    pub id: i64,
    pub note_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNoteFolder {
    pub name: String,
}

impl NewNoteFolder {
    pub fn validate(&self) -> Result<()> {
        let mut checker = Checker::body();
        checker.length("name", &self.name, 1, 255);
        checker.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNoteFile {
    pub name: String,
    pub author: String,
    pub format: String,
    /// Display label for when the file was produced
    #[serde(default)]
    pub created_label: Option<String>,
    /// Pin the file to a specific revision
    #[serde(default)]
    pub rev_no: Option<u32>,
}

impl NewNoteFile {
    pub fn validate(&self) -> Result<()> {
        let mut checker = Checker::body();
        checker
            .length("name", &self.name, 1, 255)
            .length("author", &self.author, 1, 100)
            .length("format", &self.format, 1, 20);
        checker.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn is_decided(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

impl FromStr for ApprovalStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(Error::InvalidInput(format!("Unknown approval status: {other}"))),
        }
    }
}

/// One sign-off step on a revision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Approval {
    pub id: Uuid,
    pub note_revision_id: Uuid,
    pub step_no: u32,
    pub approver_id: Uuid,
    pub status: ApprovalStatus,
    pub comment: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewApproval {
    pub step_no: u32,
    pub approver_id: Uuid,
}

impl NewApproval {
    pub fn validate(&self) -> Result<()> {
        let mut checker = Checker::body();
        checker.at_least("step_no", Some(i64::from(self.step_no)), 1);
        checker.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalDecision {
    pub status: ApprovalStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ApprovalDecision {
    pub fn validate(&self) -> Result<()> {
        if self.status.is_decided() {
            Ok(())
        } else {
            Err(Error::InvalidInput(
                "Decision must be 'approved' or 'rejected'".to_string(),
            ))
        }
    }
}
