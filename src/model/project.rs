//! Projects and invited project members

use crate::validate::{Checker, parse_form_date};
use crate::{Error, FieldIssue, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::UNASSIGNED;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Active,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Active => "active",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "draft" => Ok(ProjectStatus::Draft),
            "active" => Ok(ProjectStatus::Active),
            other => Err(Error::Validation(vec![
                FieldIssue::new("enum", "form", "status", "Input should be 'draft' or 'active'")
                    .with_input(other),
            ])),
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub org_id: Option<Uuid>,
    pub name: String,
    pub status: ProjectStatus,
    pub manager: String,
    pub organization: String,
    pub code: Option<String>,
    pub pi_name: Option<String>,
    pub description: String,
    pub duration_months: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Every column a new project row needs; both create paths lower into this.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub org_id: Option<Uuid>,
    pub name: String,
    pub status: ProjectStatus,
    pub manager: String,
    pub organization: String,
    pub code: Option<String>,
    pub pi_name: Option<String>,
    pub description: String,
    pub duration_months: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
}

/// JSON payload for organization-scoped projects.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub org_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub pi_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration_months: Option<i64>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

impl NewProject {
    pub fn validate(&self) -> Result<()> {
        let mut checker = Checker::body();
        checker
            .length("name", &self.name, 1, 100)
            .max_length("code", self.code.as_deref(), 25)
            .max_length("pi_name", self.pi_name.as_deref(), 20)
            .at_least("duration_months", self.duration_months, 1);
        checker.finish()
    }

    pub fn into_draft(self) -> ProjectDraft {
        ProjectDraft {
            org_id: Some(self.org_id),
            name: self.name,
            status: ProjectStatus::Active,
            manager: UNASSIGNED.to_string(),
            organization: UNASSIGNED.to_string(),
            code: self.code,
            pi_name: self.pi_name,
            description: self.description.unwrap_or_default(),
            duration_months: self.duration_months,
            start_date: self.start_date,
            end_date: self.end_date,
            created_by: self.created_by,
        }
    }
}

/// Project-management form. Missing fields fall back to placeholders.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProjectForm {
    pub name: Option<String>,
    pub manager: Option<String>,
    pub organization: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub invited_members: Option<String>,
}

impl ProjectForm {
    pub fn into_draft(self) -> Result<(ProjectDraft, Vec<InvitedMember>)> {
        let start_date = parse_form_date("start_date", self.start_date.as_deref().unwrap_or(""))?;
        let end_date = parse_form_date("end_date", self.end_date.as_deref().unwrap_or(""))?;
        let status: ProjectStatus = self.status.as_deref().unwrap_or("").parse()?;
        let code = self.code.filter(|c| !c.trim().is_empty());

        let invited = InvitedMember::parse_list(self.invited_members.as_deref().unwrap_or("[]"));
        let draft = ProjectDraft {
            org_id: None,
            name: non_blank(self.name, "New project"),
            status,
            manager: non_blank(self.manager, UNASSIGNED),
            organization: non_blank(self.organization, UNASSIGNED),
            code,
            pi_name: None,
            description: self.description.unwrap_or_default(),
            duration_months: None,
            start_date,
            end_date,
            created_by: None,
        };
        Ok((draft, invited))
    }
}

fn non_blank(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Researcher invited into a project when it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitedMember {
    pub researcher_id: i64,
    pub role: String,
}

impl InvitedMember {
    /// Parse `[{"id": "1", "role": "admin"}, ...]`.
    ///
    /// Malformed JSON yields an empty list; entries without a positive id are skipped.
    pub fn parse_list(raw: &str) -> Vec<InvitedMember> {
        let Ok(serde_json::Value::Array(items)) = serde_json::from_str::<serde_json::Value>(raw) else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| {
                let id = match item.get("id")? {
                    serde_json::Value::Number(n) => n.as_i64()?,
                    serde_json::Value::String(s) => s.trim().parse().ok()?,
                    _ => return None,
                };
                if id <= 0 {
                    return None;
                }
                let role = item
                    .get("role")
                    .and_then(|r| r.as_str())
                    .filter(|r| !r.is_empty())
                    .unwrap_or("member");
                Some(InvitedMember {
                    researcher_id: id,
                    role: role.to_string(),
                })
            })
            .collect()
    }
}
