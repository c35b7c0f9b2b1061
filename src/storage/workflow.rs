use rusqlite::{params, OptionalExtension};
use crate::model::{DataUpdate, SignatureState};
use crate::Result;
use super::sqlite::now;
use super::SqliteStore;

impl SqliteStore {
    // ========== Data Update Operations ==========

    pub fn create_data_update(&self, target: &str, status: &str) -> Result<DataUpdate> {
        let updated_at = now();
        self.conn.execute(
            "INSERT INTO data_updates (target, status, updated_at) VALUES (?1, ?2, ?3)",
            params![target, status, updated_at],
        )?;
        let update = DataUpdate {
            id: self.conn.last_insert_rowid(),
            target: target.to_string(),
            status: status.to_string(),
            updated_at,
        };
        tracing::info!(update = %update.label(), target, status, "Recorded data update");
        Ok(update)
    }

    /// Newest first
    pub fn list_data_updates(&self) -> Result<Vec<DataUpdate>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, target, status, updated_at FROM data_updates ORDER BY updated_at DESC, id DESC",
        )?;
        let updates = stmt
            .query_map([], |row| {
                Ok(DataUpdate {
                    id: row.get(0)?,
                    target: row.get(1)?,
                    status: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(updates)
    }

    // ========== Signature Operations ==========

    /// The singleton signature row, created with defaults on first read
    pub fn read_signature(&self) -> Result<SignatureState> {
        let defaults = SignatureState::default();
        self.conn.execute(
            "INSERT OR IGNORE INTO signature_state (id, last_signed_by, last_signed_at, status, updated_at)
             VALUES (1, ?1, NULL, ?2, ?3)",
            params![defaults.last_signed_by, defaults.status, now()],
        )?;
        let state = self
            .conn
            .query_row(
                "SELECT last_signed_by, last_signed_at, status FROM signature_state WHERE id = 1",
                [],
                |row| {
                    Ok(SignatureState {
                        last_signed_by: row.get(0)?,
                        last_signed_at: row.get(1)?,
                        status: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(state.unwrap_or(defaults))
    }

    /// Record a signature. Blank values keep what was stored before.
    pub fn update_signature(&self, signed_by: &str, status: &str) -> Result<SignatureState> {
        let current = self.read_signature()?;
        let signed_by = if signed_by.trim().is_empty() {
            current.last_signed_by
        } else {
            signed_by.to_string()
        };
        let status = if status.trim().is_empty() {
            current.status
        } else {
            status.to_string()
        };
        let at = now();
        self.conn.execute(
            "UPDATE signature_state SET last_signed_by = ?1, status = ?2, last_signed_at = ?3, updated_at = ?3
             WHERE id = 1",
            params![signed_by, status, at],
        )?;
        tracing::info!(signed_by = %signed_by, status = %status, "Updated signature");
        Ok(SignatureState {
            last_signed_by: signed_by,
            last_signed_at: Some(at),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_updates_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_data_update("Research data", "queued").unwrap();
        let latest = store.create_data_update("Plate reader export", "done").unwrap();

        let updates = store.list_data_updates().unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0], latest);
    }

    #[test]
    fn test_signature_defaults_and_update() {
        let store = SqliteStore::open_in_memory().unwrap();
        let initial = store.read_signature().unwrap();
        assert_eq!(initial.status, "valid");
        assert_eq!(initial.last_signed_at, None);

        let signed = store.update_signature("Kim", "").unwrap();
        assert_eq!(signed.last_signed_by, "Kim");
        assert_eq!(signed.status, "valid");

        let revoked = store.update_signature("", "revoked").unwrap();
        assert_eq!(revoked.last_signed_by, "Kim");
        assert_eq!(store.read_signature().unwrap().status, "revoked");
    }
}
