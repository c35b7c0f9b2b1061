//! Users and organizations

use rusqlite::{params, OptionalExtension};
use uuid::Uuid;
use crate::model::{NewOrganization, NewUser, Organization, User};
use crate::{Error, Result};
use super::sqlite::{conflict_on_constraint, now, opt_uuid_at, uuid_at};
use super::SqliteStore;

const USER_COLUMNS: &str = "id, email, full_name, organization_id, status, created_at, updated_at";

const ORGANIZATION_COLUMNS: &str =
    "id, name, code, status, created_by, admin_user_id, created_at, updated_at, deleted_at";

impl SqliteStore {
    // ========== User Operations ==========

    pub fn create_user(&self, new: &NewUser) -> Result<User> {
        let at = now();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.clone(),
            full_name: new.full_name.clone(),
            organization_id: None,
            status: "active".to_string(),
            created_at: at,
            updated_at: at,
        };
        self.conn
            .execute(
                "INSERT INTO users (id, email, full_name, organization_id, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6)",
                params![
                    user.id.to_string(),
                    user.email,
                    user.full_name,
                    user.status,
                    user.created_at,
                    user.updated_at,
                ],
            )
            .map_err(conflict_on_constraint("Email already exists"))?;
        tracing::debug!(user_id = %user.id, "Created user");
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, rowid"))?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [id.to_string()],
                row_to_user,
            )
            .optional()
            .map_err(Into::into)
    }

    // ========== Organization Operations ==========

    pub fn create_organization(&self, new: &NewOrganization) -> Result<Organization> {
        if let Some(creator) = new.created_by {
            if self.get_user(creator)?.is_none() {
                return Err(Error::not_found("User"));
            }
        }

        let at = now();
        let org = Organization {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            code: new.code.clone(),
            status: "active".to_string(),
            created_by: new.created_by,
            admin_user_id: None,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        };
        self.conn
            .execute(
                "INSERT INTO organizations (id, name, code, status, created_by, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    org.id.to_string(),
                    org.name,
                    org.code,
                    org.status,
                    org.created_by.map(|u| u.to_string()),
                    org.created_at,
                    org.updated_at,
                ],
            )
            .map_err(conflict_on_constraint("Organization code already exists"))?;
        tracing::info!(org_id = %org.id, name = %org.name, "Created organization");
        Ok(org)
    }

    pub fn list_organizations(&self) -> Result<Vec<Organization>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations
             WHERE deleted_at IS NULL ORDER BY created_at, rowid"
        ))?;
        let orgs = stmt
            .query_map([], row_to_organization)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(orgs)
    }

    /// Live organization by id; soft-deleted rows read as missing
    pub fn get_organization(&self, id: Uuid) -> Result<Option<Organization>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {ORGANIZATION_COLUMNS} FROM organizations
                     WHERE id = ?1 AND deleted_at IS NULL"
                ),
                [id.to_string()],
                row_to_organization,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn soft_delete_organization(&self, id: Uuid) -> Result<()> {
        let at = now();
        let changed = self.conn.execute(
            "UPDATE organizations SET deleted_at = ?2, updated_at = ?2
             WHERE id = ?1 AND deleted_at IS NULL",
            params![id.to_string(), at],
        )?;
        if changed == 0 {
            return Err(Error::not_found("Organization"));
        }
        tracing::info!(org_id = %id, "Soft-deleted organization");
        Ok(())
    }
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        organization_id: opt_uuid_at(row, 3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_organization(row: &rusqlite::Row) -> rusqlite::Result<Organization> {
    Ok(Organization {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        status: row.get(3)?,
        created_by: opt_uuid_at(row, 4)?,
        admin_user_id: opt_uuid_at(row, 5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        deleted_at: row.get(8)?,
    })
}
