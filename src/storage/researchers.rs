use rusqlite::{params, OptionalExtension};
use crate::model::{NewResearcher, Researcher};
use crate::Result;
use super::sqlite::conflict_on_constraint;
use super::SqliteStore;

impl SqliteStore {
    // ========== Researcher Operations ==========

    pub fn create_researcher(&self, new: &NewResearcher) -> Result<Researcher> {
        let mut researcher = Researcher {
            id: 0,
            name: new.name().to_string(),
            role: new.role().to_string(),
            email: new.email(),
            organization: new.organization().to_string(),
            major: new.major().to_string(),
            status: "active".to_string(),
        };
        self.conn
            .execute(
                "INSERT INTO researchers (name, role, email, organization, major, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    researcher.name,
                    researcher.role,
                    researcher.email,
                    researcher.organization,
                    researcher.major,
                    researcher.status,
                ],
            )
            .map_err(conflict_on_constraint("Researcher email already exists"))?;
        researcher.id = self.conn.last_insert_rowid();
        tracing::info!(researcher_id = researcher.id, name = %researcher.name, "Registered researcher");
        Ok(researcher)
    }

    pub fn list_researchers(&self) -> Result<Vec<Researcher>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, role, email, organization, major, status FROM researchers ORDER BY id",
        )?;
        let researchers = stmt
            .query_map([], row_to_researcher)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(researchers)
    }

    pub fn get_researcher(&self, id: i64) -> Result<Option<Researcher>> {
        self.conn
            .query_row(
                "SELECT id, name, role, email, organization, major, status FROM researchers WHERE id = ?1",
                [id],
                row_to_researcher,
            )
            .optional()
            .map_err(Into::into)
    }
}

fn row_to_researcher(row: &rusqlite::Row) -> rusqlite::Result<Researcher> {
    Ok(Researcher {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        email: row.get(3)?,
        organization: row.get(4)?,
        major: row.get(5)?,
        status: row.get(6)?,
    })
}
