//! SQLite storage implementation

use std::path::Path;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;
use crate::model::DashboardSummary;
use crate::{Error, Result};
use super::schema;

/// SQLite-backed storage for every ProjectNote entity
pub struct SqliteStore {
    pub(super) conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Statistics ==========

    /// Counts shown on the dashboard; soft-deleted rows are excluded
    pub fn dashboard_summary(&self) -> Result<DashboardSummary> {
        Ok(DashboardSummary {
            organizations: self.count("SELECT COUNT(*) FROM organizations WHERE deleted_at IS NULL")?,
            projects: self.count("SELECT COUNT(*) FROM projects WHERE deleted_at IS NULL")?,
            notes: self.count("SELECT COUNT(*) FROM research_notes WHERE deleted_at IS NULL")?,
            revisions: self.count(
                "SELECT COUNT(*) FROM note_revisions r
                 JOIN research_notes n ON n.id = r.note_id
                 WHERE n.deleted_at IS NULL",
            )?,
        })
    }

    /// Row counts of every table
    pub fn stats(&self) -> Result<Vec<TableCount>> {
        self.table_counts(schema::ALL_TABLES)
    }

    /// Row counts of the tables the admin screens manage
    pub fn list_managed_tables(&self) -> Result<Vec<TableCount>> {
        self.table_counts(schema::MANAGED_TABLES)
    }

    fn table_counts(&self, tables: &[&str]) -> Result<Vec<TableCount>> {
        let mut counts = Vec::with_capacity(tables.len());
        for table in tables {
            if !self.table_exists(table)? {
                continue;
            }
            counts.push(TableCount {
                table: table.to_string(),
                rows: self.count(&format!("SELECT COUNT(*) FROM \"{table}\""))?,
            });
        }
        Ok(counts)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let found: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(found > 0)
    }

    pub(super) fn count(&self, sql: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Bulk Operations ==========

    /// Delete every row of a managed table.
    ///
    /// Truncating `teams` also removes admin accounts bound to a team, and
    /// truncating `note_revisions` clears each note's current revision.
    pub fn truncate_table(&self, table: &str) -> Result<()> {
        if !schema::MANAGED_TABLES.contains(&table) {
            return Err(Error::InvalidInput(format!("{table} is not a managed table")));
        }
        if !self.table_exists(table)? {
            return Err(Error::InvalidInput(format!("Table {table} does not exist")));
        }

        let tx = self.conn.unchecked_transaction()?;
        match table {
            "teams" => {
                tx.execute("DELETE FROM admin_accounts WHERE team_id IS NOT NULL", [])?;
            }
            "note_revisions" => {
                tx.execute("UPDATE research_notes SET current_revision_id = NULL", [])?;
            }
            _ => {}
        }
        tx.execute(&format!("DELETE FROM \"{table}\""), [])
            .map_err(conflict_on_constraint(&format!(
                "Rows of {table} are still referenced by other tables"
            )))?;
        tx.commit()?;
        tracing::info!(table, "Truncated table");
        Ok(())
    }

    /// Delete all data (for re-seeding)
    pub fn clear_all(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("UPDATE research_notes SET current_revision_id = NULL", [])?;
        tx.execute("UPDATE users SET organization_id = NULL", [])?;
        for table in schema::ALL_TABLES {
            tx.execute(&format!("DELETE FROM \"{table}\""), [])?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Row count of one table
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableCount {
    pub table: String,
    pub rows: usize,
}

pub(super) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Read a TEXT column holding a UUID
pub(super) fn uuid_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(super) fn opt_uuid_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        Uuid::parse_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    })
    .transpose()
}

/// Parse a TEXT column through `FromStr`, as the model enums implement it
pub(super) fn parsed_at<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = Error>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(super) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Map a constraint violation to `Error::Conflict`, anything else to `Error::Storage`
pub(super) fn conflict_on_constraint(message: &str) -> impl FnOnce(rusqlite::Error) -> Error + '_ {
    move |err| {
        if is_constraint_violation(&err) {
            Error::Conflict(message.to_string())
        } else {
            Error::Storage(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewResearcher, ProjectForm};

    #[test]
    fn test_empty_store() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.dashboard_summary().unwrap(), DashboardSummary::default());

        let stats = store.stats().unwrap();
        assert_eq!(stats.len(), schema::ALL_TABLES.len());
        assert!(stats.iter().all(|t| t.rows == 0));
    }

    #[test]
    fn test_truncate_rejects_unmanaged() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(store.truncate_table("users"), Err(Error::InvalidInput(_))));
        assert!(matches!(store.truncate_table("sqlite_master"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_truncate_referenced_rows_conflict() {
        let store = SqliteStore::open_in_memory().unwrap();
        let researcher = store.create_researcher(&NewResearcher::default()).unwrap();
        let form = ProjectForm {
            invited_members: Some(format!(r#"[{{"id": {}}}]"#, researcher.id)),
            ..Default::default()
        };
        let (draft, invited) = form.into_draft().unwrap();
        store.create_project_with_members(&draft, &invited).unwrap();

        assert!(matches!(store.truncate_table("researchers"), Err(Error::Conflict(_))));
        store.truncate_table("project_members").unwrap();
        store.truncate_table("researchers").unwrap();

        let tables = store.list_managed_tables().unwrap();
        let researchers = tables.iter().find(|t| t.table == "researchers").unwrap();
        assert_eq!(researchers.rows, 0);
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.create_researcher(&NewResearcher::default()).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.list_researchers().unwrap().len(), 1);
    }
}
