//! Organizations and API users

use crate::Result;
use crate::validate::Checker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub status: String,
    pub created_by: Option<Uuid>,
    /// The single administrating user, unique across organizations
    pub admin_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

impl NewOrganization {
    pub fn validate(&self) -> Result<()> {
        let mut checker = Checker::body();
        checker
            .length("name", &self.name, 1, 100)
            .max_length("code", self.code.as_deref(), 30);
        checker.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub organization_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        let mut checker = Checker::body();
        checker
            .email("email", &self.email)
            .length("full_name", &self.full_name, 1, 200);
        checker.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_limits() {
        let ok = NewOrganization {
            name: "Deep Lab".into(),
            code: Some("DL".into()),
            created_by: None,
        };
        assert!(ok.validate().is_ok());

        let long_code = NewOrganization {
            name: "Deep Lab".into(),
            code: Some("x".repeat(31)),
            created_by: None,
        };
        assert!(long_code.validate().is_err());
    }

    #[test]
    fn test_user_requires_email() {
        let user = NewUser {
            email: "nope".into(),
            full_name: "Kim".into(),
        };
        assert!(user.validate().is_err());
    }
}
