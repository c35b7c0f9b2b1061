//! Teams, sign-in accounts and the session profile

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Admin,
    Member,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Admin => "admin",
            AccountRole::Member => "member",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            AccountRole::Admin => "Administrator",
            AccountRole::Member => "Member",
        }
    }
}

impl FromStr for AccountRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "member" => Ok(AccountRole::Member),
            "admin" => Ok(AccountRole::Admin),
            other => Err(Error::InvalidInput(format!("Unknown role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub join_code: String,
    pub created_at: DateTime<Utc>,
}

/// The super-admin account created once from the admin screens.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminAccount {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub team: Option<String>,
    pub is_super_admin: bool,
}

/// Row of the combined admin/user account listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccountSummary {
    pub id: i64,
    pub kind: &'static str,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub team: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of a sign-up: the new account and, for admins, the team it created
/// or, for members, the team it joined.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Registration {
    #[serde(flatten)]
    pub account: AccountSummary,
    pub joined_team: Option<Team>,
}

/// Sign-up form.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Signup {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub team_name: String,
    pub team_description: String,
    pub team_code: String,
}

impl Signup {
    pub fn validate(&self) -> Result<AccountRole> {
        require_all(&[
            &self.username,
            &self.display_name,
            &self.email,
            &self.password,
        ])?;
        let role: AccountRole = self.role.parse()?;
        if role == AccountRole::Admin && self.team_name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "team_name is required when signing up as admin".to_string(),
            ));
        }
        Ok(role)
    }
}

/// Initial super-admin form.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct NewAdmin {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub team_id: Option<String>,
}

impl NewAdmin {
    pub fn validate(&self) -> Result<()> {
        require_all(&[
            &self.username,
            &self.display_name,
            &self.email,
            &self.password,
        ])
    }

    pub fn team_id(&self) -> Option<i64> {
        self.team_id.as_deref().and_then(|t| t.trim().parse().ok())
    }
}

fn require_all(fields: &[&String]) -> Result<()> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(Error::InvalidInput(
            "username, display_name, email and password are required".to_string(),
        ));
    }
    Ok(())
}

/// What the session remembers about the signed-in person.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    pub username: String,
    pub name: String,
    pub role: String,
    pub email: String,
    pub organization: String,
    pub major: String,
    #[serde(default)]
    pub signature_data_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_requires_fields() {
        let signup = Signup {
            username: "kim".into(),
            ..Default::default()
        };
        assert!(matches!(signup.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_admin_signup_needs_team() {
        let signup = Signup {
            username: "kim".into(),
            display_name: "Kim".into(),
            email: "kim@example.com".into(),
            password: "pw".into(),
            role: "admin".into(),
            ..Default::default()
        };
        assert!(signup.validate().is_err());

        let member = Signup {
            role: "member".into(),
            ..signup
        };
        assert_eq!(member.validate().unwrap(), AccountRole::Member);
    }
}
