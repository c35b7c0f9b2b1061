//! Researchers and organization-grouped researcher listings

use crate::Result;
use crate::validate::Checker;
use serde::{Deserialize, Serialize};

use super::UNASSIGNED;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Researcher {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub email: String,
    pub organization: String,
    pub major: String,
    pub status: String,
}

/// Researcher registration form.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct NewResearcher {
    pub name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub organization: Option<String>,
    pub major: Option<String>,
}

impl NewResearcher {
    pub fn name(&self) -> &str {
        pick(&self.name, "New researcher")
    }

    pub fn role(&self) -> &str {
        pick(&self.role, "Researcher")
    }

    pub fn organization(&self) -> &str {
        pick(&self.organization, UNASSIGNED)
    }

    pub fn major(&self) -> &str {
        pick(&self.major, UNASSIGNED)
    }

    /// Given email, or a unique placeholder derived from the current time.
    pub fn email(&self) -> String {
        match self.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) => email.to_string(),
            None => format!(
                "unknown-{}@example.com",
                chrono::Utc::now().timestamp_micros()
            ),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut checker = Checker::form();
        checker
            .length("name", self.name(), 1, 100)
            .length("role", self.role(), 1, 100)
            .email("email", &self.email());
        checker.finish()
    }
}

fn pick<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(fallback)
}

/// Researchers of one organization, as shown on project screens.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResearcherGroup {
    pub group: String,
    pub lead: String,
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupMember {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub organization: String,
    pub major: String,
    pub contribution: Option<String>,
}

impl ResearcherGroup {
    /// Group consecutive members by organization, preserving input order.
    pub fn group_by_organization(members: Vec<GroupMember>) -> Vec<ResearcherGroup> {
        let mut groups: Vec<ResearcherGroup> = Vec::new();
        for member in members {
            match groups
                .iter_mut()
                .find(|g| g.members.first().map(|m| &m.organization) == Some(&member.organization))
            {
                Some(group) => group.members.push(member),
                None => groups.push(ResearcherGroup {
                    group: format!("{} research group", member.organization),
                    lead: member.name.clone(),
                    members: vec![member],
                }),
            }
        }
        groups
    }
}
