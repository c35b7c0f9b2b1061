//! Projects and project membership

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;
use crate::model::{GroupMember, InvitedMember, Project, ProjectDraft, ResearcherGroup};
use crate::{Error, Result};
use super::sqlite::{conflict_on_constraint, now, opt_uuid_at, parsed_at, uuid_at};
use super::SqliteStore;

const PROJECT_COLUMNS: &str = "id, org_id, name, status, manager, organization, code, pi_name, \
    description, duration_months, start_date, end_date, created_by, created_at, updated_at, deleted_at";

impl SqliteStore {
    // ========== Project Operations ==========

    /// Insert a project. An org_id must name a live organization.
    pub fn create_project(&self, draft: &ProjectDraft) -> Result<Project> {
        self.create_project_with_members(draft, &[])
    }

    /// Insert a project and its invited members in one transaction.
    ///
    /// Invitations naming unknown researchers are skipped; an existing
    /// membership is left as it was.
    pub fn create_project_with_members(
        &self,
        draft: &ProjectDraft,
        invited: &[InvitedMember],
    ) -> Result<Project> {
        if let Some(org_id) = draft.org_id {
            if self.get_organization(org_id)?.is_none() {
                return Err(Error::not_found("Organization"));
            }
        }

        let tx = self.conn.unchecked_transaction()?;
        let project = insert_project(&tx, draft)?;
        let mut added = 0;
        for member in invited {
            let known: Option<i64> = tx
                .query_row(
                    "SELECT id FROM researchers WHERE id = ?1",
                    [member.researcher_id],
                    |row| row.get(0),
                )
                .optional()?;
            if known.is_none() {
                tracing::debug!(researcher_id = member.researcher_id, "Skipping unknown invited researcher");
                continue;
            }
            added += tx.execute(
                "INSERT OR IGNORE INTO project_members (project_id, researcher_id, role)
                 VALUES (?1, ?2, ?3)",
                params![project.id.to_string(), member.researcher_id, member.role],
            )?;
        }
        tx.commit()?;

        tracing::info!(project_id = %project.id, name = %project.name, members = added, "Created project");
        Ok(project)
    }

    /// Live projects, newest first, optionally limited to one organization
    pub fn list_projects(&self, org_id: Option<Uuid>) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE deleted_at IS NULL AND (?1 IS NULL OR org_id = ?1)
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let projects = stmt
            .query_map([org_id.map(|id| id.to_string())], row_to_project)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    pub fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        self.conn
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1 AND deleted_at IS NULL"),
                [id.to_string()],
                row_to_project,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn soft_delete_project(&self, id: Uuid) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET deleted_at = ?2, updated_at = ?2
             WHERE id = ?1 AND deleted_at IS NULL",
            params![id.to_string(), now()],
        )?;
        if changed == 0 {
            return Err(Error::not_found("Project"));
        }
        tracing::info!(project_id = %id, "Soft-deleted project");
        Ok(())
    }

    // ========== Membership Operations ==========

    /// Members of one project grouped by their organization
    pub fn project_researcher_groups(&self, project_id: Uuid) -> Result<Vec<ResearcherGroup>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.name, pm.role, r.organization, r.major, pm.contribution
             FROM project_members pm
             JOIN researchers r ON r.id = pm.researcher_id
             WHERE pm.project_id = ?1
             ORDER BY pm.rowid",
        )?;
        let members = stmt
            .query_map([project_id.to_string()], row_to_group_member)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ResearcherGroup::group_by_organization(members))
    }

    /// Every researcher grouped by organization, for the project invite picker
    pub fn researcher_groups_for_selection(&self) -> Result<Vec<ResearcherGroup>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, role, organization, major, NULL
             FROM researchers ORDER BY organization, id",
        )?;
        let members = stmt
            .query_map([], row_to_group_member)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ResearcherGroup::group_by_organization(members))
    }

    pub fn count_project_members(&self, project_id: Uuid) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM project_members WHERE project_id = ?1",
            [project_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn insert_project(conn: &Connection, draft: &ProjectDraft) -> Result<Project> {
    let at = now();
    let project = Project {
        id: Uuid::new_v4(),
        org_id: draft.org_id,
        name: draft.name.clone(),
        status: draft.status,
        manager: draft.manager.clone(),
        organization: draft.organization.clone(),
        code: draft.code.clone(),
        pi_name: draft.pi_name.clone(),
        description: draft.description.clone(),
        duration_months: draft.duration_months,
        start_date: draft.start_date,
        end_date: draft.end_date,
        created_by: draft.created_by,
        created_at: at,
        updated_at: at,
        deleted_at: None,
    };
    conn.execute(
        &format!(
            "INSERT INTO projects ({PROJECT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, NULL)"
        ),
        params![
            project.id.to_string(),
            project.org_id.map(|id| id.to_string()),
            project.name,
            project.status.as_str(),
            project.manager,
            project.organization,
            project.code,
            project.pi_name,
            project.description,
            project.duration_months,
            project.start_date,
            project.end_date,
            project.created_by.map(|id| id.to_string()),
            project.created_at,
            project.updated_at,
        ],
    )
    .map_err(conflict_on_constraint("Project code already exists in this organization"))?;
    Ok(project)
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: uuid_at(row, 0)?,
        org_id: opt_uuid_at(row, 1)?,
        name: row.get(2)?,
        status: parsed_at(row, 3)?,
        manager: row.get(4)?,
        organization: row.get(5)?,
        code: row.get(6)?,
        pi_name: row.get(7)?,
        description: row.get(8)?,
        duration_months: row.get(9)?,
        start_date: row.get(10)?,
        end_date: row.get(11)?,
        created_by: opt_uuid_at(row, 12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
        deleted_at: row.get(15)?,
    })
}

fn row_to_group_member(row: &rusqlite::Row) -> rusqlite::Result<GroupMember> {
    Ok(GroupMember {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        organization: row.get(3)?,
        major: row.get(4)?,
        contribution: row.get(5)?,
    })
}
