//! Research notes, hash-chained revisions, attachments and approvals

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;
use crate::chain::{self, ChainLink, ChainReport};
use crate::model::{
    Approval, ApprovalDecision, ApprovalStatus, NewApproval, NewNote, NewNoteFile, NewRevision,
    NoteCard, NoteFile, NoteFolder, NoteRevision, NoteUpdate, ResearchNote,
};
use crate::{Error, Result};
use super::sqlite::{conflict_on_constraint, now, opt_uuid_at, parsed_at, uuid_at};
use super::SqliteStore;

const NOTE_COLUMNS: &str = "id, project_id, title, entry_date, owner, period, summary, created_by, \
    current_revision_id, created_at, updated_at";

const REVISION_COLUMNS: &str = "id, note_id, rev_no, content_md, content_json, prev_hash, \
    content_hash, chain_hash, created_by, created_at";

const APPROVAL_COLUMNS: &str =
    "id, note_revision_id, step_no, approver_id, status, comment, decided_at, created_at";

const CARD_SELECT: &str = r#"
SELECT n.id, n.title, n.owner, n.project_id, COALESCE(p.code, ''), n.period,
       (SELECT COUNT(*) FROM note_files f WHERE f.note_id = n.id),
       (SELECT COUNT(*) FROM project_members m WHERE m.project_id = n.project_id),
       n.summary,
       (SELECT r.rev_no FROM note_revisions r WHERE r.id = n.current_revision_id),
       n.updated_at
FROM research_notes n
LEFT JOIN projects p ON p.id = n.project_id
WHERE n.deleted_at IS NULL
"#;

impl SqliteStore {
    // ========== Note Operations ==========

    /// Create a note together with its baseline revision (rev 1).
    pub fn create_note(&self, new: &NewNote) -> Result<ResearchNote> {
        if self.get_project(new.project_id)?.is_none() {
            return Err(Error::not_found("Project"));
        }

        let at = now();
        let mut note = ResearchNote {
            id: Uuid::new_v4(),
            project_id: Some(new.project_id),
            title: new.title.clone(),
            entry_date: Some(new.entry_date),
            owner: new.owner.clone().unwrap_or_default(),
            period: new.period.clone().unwrap_or_default(),
            summary: new.summary.clone().unwrap_or_default(),
            created_by: new.created_by,
            current_revision_id: None,
            created_at: at,
            updated_at: at,
        };

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO research_notes ({NOTE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9, ?10)"
            ),
            params![
                note.id.to_string(),
                note.project_id.map(|id| id.to_string()),
                note.title,
                note.entry_date,
                note.owner,
                note.period,
                note.summary,
                note.created_by.map(|id| id.to_string()),
                note.created_at,
                note.updated_at,
            ],
        )?;
        let link = ChainLink::next(None, &new.content_md);
        let revision = insert_revision(&tx, note.id, link, &new.baseline())?;
        set_current_revision(&tx, &revision)?;
        tx.commit()?;

        note.current_revision_id = Some(revision.id);
        tracing::info!(note_id = %note.id, chain_hash = %revision.chain_hash, "Created note");
        Ok(note)
    }

    /// Append the next revision to a note's chain.
    pub fn append_revision(&self, note_id: Uuid, new: &NewRevision) -> Result<NoteRevision> {
        if self.get_note(note_id)?.is_none() {
            return Err(Error::not_found("Note"));
        }

        let tx = self.conn.unchecked_transaction()?;
        let last: Option<(u32, String)> = tx
            .query_row(
                "SELECT rev_no, chain_hash FROM note_revisions
                 WHERE note_id = ?1 ORDER BY rev_no DESC LIMIT 1",
                [note_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((rev_no, chain_hash)) = last else {
            return Err(Error::InvalidInput("Note has no baseline revision".to_string()));
        };

        let link = ChainLink::next(Some((rev_no, &chain_hash)), &new.content_md);
        let revision = insert_revision(&tx, note_id, link, new)?;
        set_current_revision(&tx, &revision)?;
        tx.commit()?;

        tracing::info!(note_id = %note_id, rev_no = revision.rev_no, "Appended revision");
        Ok(revision)
    }

    /// Live note by id
    pub fn get_note(&self, id: Uuid) -> Result<Option<ResearchNote>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {NOTE_COLUMNS} FROM research_notes WHERE id = ?1 AND deleted_at IS NULL"
                ),
                [id.to_string()],
                row_to_note,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn soft_delete_note(&self, id: Uuid) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE research_notes SET deleted_at = ?2, updated_at = ?2
             WHERE id = ?1 AND deleted_at IS NULL",
            params![id.to_string(), now()],
        )?;
        if changed == 0 {
            return Err(Error::not_found("Note"));
        }
        tracing::info!(note_id = %id, "Soft-deleted note");
        Ok(())
    }

    /// Revisions of a live note, ordered by rev_no
    pub fn list_revisions(&self, note_id: Uuid) -> Result<Vec<NoteRevision>> {
        if self.get_note(note_id)?.is_none() {
            return Err(Error::not_found("Note"));
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REVISION_COLUMNS} FROM note_revisions WHERE note_id = ?1 ORDER BY rev_no"
        ))?;
        let revisions = stmt
            .query_map([note_id.to_string()], row_to_revision)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(revisions)
    }

    pub fn get_revision(&self, note_id: Uuid, rev_no: u32) -> Result<Option<NoteRevision>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {REVISION_COLUMNS} FROM note_revisions WHERE note_id = ?1 AND rev_no = ?2"
                ),
                params![note_id.to_string(), rev_no],
                row_to_revision,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Recompute the whole chain of a note
    pub fn verify_note(&self, note_id: Uuid) -> Result<ChainReport> {
        let revisions = self.list_revisions(note_id)?;
        let report = chain::verify(note_id, &revisions);
        if !report.valid {
            tracing::warn!(note_id = %note_id, first_break = ?report.first_break, "Revision chain is broken");
        }
        Ok(report)
    }

    // ========== Note Card Operations ==========

    /// Live notes as cards, most recently updated first
    pub fn list_note_cards(&self, project_id: Option<Uuid>) -> Result<Vec<NoteCard>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CARD_SELECT} AND (?1 IS NULL OR n.project_id = ?1)
             ORDER BY n.updated_at DESC, n.rowid DESC"
        ))?;
        let cards = stmt
            .query_map([project_id.map(|id| id.to_string())], row_to_card)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    pub fn get_note_card(&self, id: Uuid) -> Result<Option<NoteCard>> {
        self.conn
            .query_row(&format!("{CARD_SELECT} AND n.id = ?1"), [id.to_string()], row_to_card)
            .optional()
            .map_err(Into::into)
    }

    /// Change title and/or summary; blank values leave the field as it was
    pub fn update_note(&self, id: Uuid, update: &NoteUpdate) -> Result<NoteCard> {
        let changed = self.conn.execute(
            "UPDATE research_notes
             SET title = COALESCE(?2, title), summary = COALESCE(?3, summary), updated_at = ?4
             WHERE id = ?1 AND deleted_at IS NULL",
            params![id.to_string(), update.title(), update.summary(), now()],
        )?;
        if changed == 0 {
            return Err(Error::not_found("Research note"));
        }
        self.get_note_card(id)?
            .ok_or_else(|| Error::not_found("Research note"))
    }

    // ========== File & Folder Operations ==========

    /// Attach a file record, pinned to `rev_no` or else the current revision
    pub fn add_note_file(&self, note_id: Uuid, new: &NewNoteFile) -> Result<NoteFile> {
        let note = self.get_note(note_id)?.ok_or_else(|| Error::not_found("Note"))?;
        let revision_id = match new.rev_no {
            Some(rev_no) => Some(
                self.get_revision(note_id, rev_no)?
                    .ok_or_else(|| Error::not_found("Revision"))?
                    .id,
            ),
            None => note.current_revision_id,
        };
        let created = new
            .created_label
            .clone()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| now().format("%Y-%m-%d").to_string());

        self.conn.execute(
            "INSERT INTO note_files (note_id, note_revision_id, name, author, format, created_label, role)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'attachment')",
            params![
                note_id.to_string(),
                revision_id.map(|id| id.to_string()),
                new.name,
                new.author,
                new.format,
                created,
            ],
        )?;
        Ok(NoteFile {
            id: self.conn.last_insert_rowid(),
            note_id,
            note_revision_id: revision_id,
            name: new.name.clone(),
            author: new.author.clone(),
            format: new.format.clone(),
            created,
            role: "attachment".to_string(),
        })
    }

    pub fn list_note_files(&self, note_id: Uuid) -> Result<Vec<NoteFile>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, note_id, note_revision_id, name, author, format, created_label, role
             FROM note_files WHERE note_id = ?1 ORDER BY id",
        )?;
        let files = stmt
            .query_map([note_id.to_string()], |row| {
                Ok(NoteFile {
                    id: row.get(0)?,
                    note_id: uuid_at(row, 1)?,
                    note_revision_id: opt_uuid_at(row, 2)?,
                    name: row.get(3)?,
                    author: row.get(4)?,
                    format: row.get(5)?,
                    created: row.get(6)?,
                    role: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    pub fn add_note_folder(&self, note_id: Uuid, name: &str) -> Result<NoteFolder> {
        if self.get_note(note_id)?.is_none() {
            return Err(Error::not_found("Note"));
        }
        self.conn.execute(
            "INSERT INTO note_folders (note_id, name) VALUES (?1, ?2)",
            params![note_id.to_string(), name],
        )?;
        Ok(NoteFolder {
            id: self.conn.last_insert_rowid(),
            note_id,
            name: name.to_string(),
        })
    }

    pub fn list_note_folders(&self, note_id: Uuid) -> Result<Vec<NoteFolder>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, note_id, name FROM note_folders WHERE note_id = ?1 ORDER BY id")?;
        let folders = stmt
            .query_map([note_id.to_string()], |row| {
                Ok(NoteFolder {
                    id: row.get(0)?,
                    note_id: uuid_at(row, 1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(folders)
    }

    // ========== Approval Operations ==========

    /// Open a pending approval step on one revision
    pub fn request_approval(&self, note_id: Uuid, rev_no: u32, new: &NewApproval) -> Result<Approval> {
        let revision = self.live_revision(note_id, rev_no)?;
        if self.get_user(new.approver_id)?.is_none() {
            return Err(Error::not_found("Approver"));
        }

        let approval = Approval {
            id: Uuid::new_v4(),
            note_revision_id: revision.id,
            step_no: new.step_no,
            approver_id: new.approver_id,
            status: ApprovalStatus::Pending,
            comment: None,
            decided_at: None,
            created_at: now(),
        };
        self.conn
            .execute(
                &format!(
                    "INSERT INTO approvals ({APPROVAL_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL, ?6)"
                ),
                params![
                    approval.id.to_string(),
                    approval.note_revision_id.to_string(),
                    approval.step_no,
                    approval.approver_id.to_string(),
                    approval.status.as_str(),
                    approval.created_at,
                ],
            )
            .map_err(conflict_on_constraint("Approval step already exists for this revision"))?;
        tracing::info!(approval_id = %approval.id, rev_no, step_no = approval.step_no, "Requested approval");
        Ok(approval)
    }

    pub fn list_approvals(&self, note_id: Uuid, rev_no: u32) -> Result<Vec<Approval>> {
        let revision = self.live_revision(note_id, rev_no)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {APPROVAL_COLUMNS} FROM approvals WHERE note_revision_id = ?1 ORDER BY step_no"
        ))?;
        let approvals = stmt
            .query_map([revision.id.to_string()], row_to_approval)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(approvals)
    }

    pub fn get_approval(&self, id: Uuid) -> Result<Option<Approval>> {
        self.conn
            .query_row(
                &format!("SELECT {APPROVAL_COLUMNS} FROM approvals WHERE id = ?1"),
                [id.to_string()],
                row_to_approval,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Approve or reject a pending step. A step is decided only once.
    pub fn decide_approval(&self, id: Uuid, decision: &ApprovalDecision) -> Result<Approval> {
        let approval = self.get_approval(id)?.ok_or_else(|| Error::not_found("Approval"))?;
        if approval.status.is_decided() {
            return Err(Error::Conflict("Approval already decided".to_string()));
        }

        let changed = self.conn.execute(
            "UPDATE approvals SET status = ?2, comment = ?3, decided_at = ?4
             WHERE id = ?1 AND status = 'pending'",
            params![id.to_string(), decision.status.as_str(), decision.comment, now()],
        )?;
        if changed == 0 {
            return Err(Error::Conflict("Approval already decided".to_string()));
        }
        tracing::info!(approval_id = %id, status = decision.status.as_str(), "Decided approval");
        self.get_approval(id)?.ok_or_else(|| Error::not_found("Approval"))
    }

    fn live_revision(&self, note_id: Uuid, rev_no: u32) -> Result<NoteRevision> {
        if self.get_note(note_id)?.is_none() {
            return Err(Error::not_found("Note"));
        }
        self.get_revision(note_id, rev_no)?
            .ok_or_else(|| Error::not_found("Revision"))
    }
}

fn insert_revision(
    conn: &Connection,
    note_id: Uuid,
    link: ChainLink,
    new: &NewRevision,
) -> Result<NoteRevision> {
    let revision = NoteRevision {
        id: Uuid::new_v4(),
        note_id,
        rev_no: link.rev_no,
        content_md: new.content_md.clone(),
        content_json: new.content_json.clone(),
        prev_hash: link.prev_hash,
        content_hash: link.content_hash,
        chain_hash: link.chain_hash,
        created_by: new.created_by,
        created_at: now(),
    };
    conn.execute(
        &format!(
            "INSERT INTO note_revisions ({REVISION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            revision.id.to_string(),
            revision.note_id.to_string(),
            revision.rev_no,
            revision.content_md,
            revision.content_json,
            revision.prev_hash,
            revision.content_hash,
            revision.chain_hash,
            revision.created_by.map(|id| id.to_string()),
            revision.created_at,
        ],
    )
    .map_err(conflict_on_constraint("Revision was appended concurrently, retry"))?;
    Ok(revision)
}

fn set_current_revision(conn: &Connection, revision: &NoteRevision) -> Result<()> {
    conn.execute(
        "UPDATE research_notes SET current_revision_id = ?2, updated_at = ?3 WHERE id = ?1",
        params![revision.note_id.to_string(), revision.id.to_string(), revision.created_at],
    )?;
    Ok(())
}

fn row_to_note(row: &rusqlite::Row) -> rusqlite::Result<ResearchNote> {
    Ok(ResearchNote {
        id: uuid_at(row, 0)?,
        project_id: opt_uuid_at(row, 1)?,
        title: row.get(2)?,
        entry_date: row.get(3)?,
        owner: row.get(4)?,
        period: row.get(5)?,
        summary: row.get(6)?,
        created_by: opt_uuid_at(row, 7)?,
        current_revision_id: opt_uuid_at(row, 8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn row_to_revision(row: &rusqlite::Row) -> rusqlite::Result<NoteRevision> {
    Ok(NoteRevision {
        id: uuid_at(row, 0)?,
        note_id: uuid_at(row, 1)?,
        rev_no: row.get(2)?,
        content_md: row.get(3)?,
        content_json: row.get(4)?,
        prev_hash: row.get(5)?,
        content_hash: row.get(6)?,
        chain_hash: row.get(7)?,
        created_by: opt_uuid_at(row, 8)?,
        created_at: row.get(9)?,
    })
}

fn row_to_card(row: &rusqlite::Row) -> rusqlite::Result<NoteCard> {
    Ok(NoteCard {
        id: uuid_at(row, 0)?,
        title: row.get(1)?,
        owner: row.get(2)?,
        project_id: opt_uuid_at(row, 3)?,
        project_code: row.get(4)?,
        period: row.get(5)?,
        files: row.get(6)?,
        members: row.get(7)?,
        summary: row.get(8)?,
        current_rev_no: row.get(9)?,
        last_updated_at: row.get(10)?,
    })
}

fn row_to_approval(row: &rusqlite::Row) -> rusqlite::Result<Approval> {
    Ok(Approval {
        id: uuid_at(row, 0)?,
        note_revision_id: uuid_at(row, 1)?,
        step_no: row.get(2)?,
        approver_id: uuid_at(row, 3)?,
        status: parsed_at(row, 4)?,
        comment: row.get(5)?,
        decided_at: row.get(6)?,
        created_at: row.get(7)?,
    })
}
