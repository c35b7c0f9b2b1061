//! Revision hash chain
//!
//! Every note revision stores:
//! - `content_hash = sha256_hex(content_md)`
//! - `prev_hash    = chain_hash` of the previous revision (None for rev 1)
//! - `chain_hash   = sha256_hex(prev_hash.unwrap_or("") + ":" + content_hash)`
//!
//! Rewriting any historical revision changes its chain hash and therefore
//! every chain hash after it.

use crate::model::NoteRevision;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Lowercase hex SHA-256 of the UTF-8 bytes of `content`.
pub fn sha256_hex(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Chain hash for a revision whose predecessor has `previous_chain_hash`.
pub fn build_chain_hash(previous_chain_hash: Option<&str>, content_hash: &str) -> String {
    sha256_hex(&format!("{}:{}", previous_chain_hash.unwrap_or(""), content_hash))
}

/// Hashes for the next link of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    pub rev_no: u32,
    pub prev_hash: Option<String>,
    pub content_hash: String,
    pub chain_hash: String,
}

impl ChainLink {
    /// Link following `previous` (`None` starts a new chain at rev 1).
    pub fn next(previous: Option<(u32, &str)>, content_md: &str) -> Self {
        let content_hash = sha256_hex(content_md);
        let (rev_no, prev_hash) = match previous {
            Some((rev_no, chain_hash)) => (rev_no + 1, Some(chain_hash.to_string())),
            None => (1, None),
        };
        let chain_hash = build_chain_hash(prev_hash.as_deref(), &content_hash);
        Self {
            rev_no,
            prev_hash,
            content_hash,
            chain_hash,
        }
    }
}

/// Why a revision failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    /// `rev_no` is not the successor of the previous revision.
    NumberingGap,
    /// `content_hash` does not match the stored content.
    ContentMismatch,
    /// `prev_hash` does not equal the previous revision's chain hash.
    PrevHashMismatch,
    /// `chain_hash` does not match `H(prev_hash ":" content_hash)`.
    ChainMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainBreak {
    pub rev_no: u32,
    pub revision_id: Uuid,
    pub kind: BreakKind,
}

/// Result of walking a note's revisions from rev 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub note_id: Uuid,
    pub revisions: usize,
    pub valid: bool,
    pub head_chain_hash: Option<String>,
    pub first_break: Option<ChainBreak>,
}

/// Verify `revisions` (sorted by `rev_no`) belonging to `note_id`.
pub fn verify(note_id: Uuid, revisions: &[NoteRevision]) -> ChainReport {
    let mut previous: Option<&NoteRevision> = None;
    let mut first_break = None;

    for revision in revisions {
        if let Some(kind) = check_link(previous, revision) {
            first_break = Some(ChainBreak {
                rev_no: revision.rev_no,
                revision_id: revision.id,
                kind,
            });
            break;
        }
        previous = Some(revision);
    }

    ChainReport {
        note_id,
        revisions: revisions.len(),
        valid: first_break.is_none(),
        head_chain_hash: revisions.last().map(|r| r.chain_hash.clone()),
        first_break,
    }
}

fn check_link(previous: Option<&NoteRevision>, revision: &NoteRevision) -> Option<BreakKind> {
    let expected_rev = previous.map_or(1, |p| p.rev_no + 1);
    if revision.rev_no != expected_rev {
        return Some(BreakKind::NumberingGap);
    }
    if sha256_hex(&revision.content_md) != revision.content_hash {
        return Some(BreakKind::ContentMismatch);
    }
    let expected_prev = previous.map(|p| p.chain_hash.as_str());
    if revision.prev_hash.as_deref() != expected_prev {
        return Some(BreakKind::PrevHashMismatch);
    }
    if build_chain_hash(expected_prev, &revision.content_hash) != revision.chain_hash {
        return Some(BreakKind::ChainMismatch);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn revision(note_id: Uuid, link: &ChainLink, content: &str) -> NoteRevision {
        NoteRevision {
            id: Uuid::new_v4(),
            note_id,
            rev_no: link.rev_no,
            content_md: content.to_string(),
            content_json: serde_json::json!({}),
            prev_hash: link.prev_hash.clone(),
            content_hash: link.content_hash.clone(),
            chain_hash: link.chain_hash.clone(),
            created_by: None,
            created_at: Utc::now(),
        }
    }

    fn chain(note_id: Uuid, contents: &[&str]) -> Vec<NoteRevision> {
        let mut out: Vec<NoteRevision> = Vec::new();
        for content in contents {
            let prev = out.last().map(|r| (r.rev_no, r.chain_hash.as_str()));
            let link = ChainLink::next(prev, content);
            out.push(revision(note_id, &link, content));
        }
        out
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_first_link_hashes_empty_prefix() {
        let link = ChainLink::next(None, "hello");
        assert_eq!(link.rev_no, 1);
        assert_eq!(link.prev_hash, None);
        assert_eq!(link.chain_hash, sha256_hex(&format!(":{}", sha256_hex("hello"))));
    }

    #[test]
    fn test_link_depends_on_previous() {
        let first = ChainLink::next(None, "same");
        let second = ChainLink::next(Some((1, &first.chain_hash)), "same");
        assert_eq!(second.rev_no, 2);
        assert_eq!(second.content_hash, first.content_hash);
        assert_ne!(second.chain_hash, first.chain_hash);
        assert_eq!(second.prev_hash.as_deref(), Some(first.chain_hash.as_str()));
    }

    #[test]
    fn test_verify_intact_chain() {
        let note_id = Uuid::new_v4();
        let revisions = chain(note_id, &["a", "b", "c"]);
        let report = verify(note_id, &revisions);
        assert!(report.valid);
        assert_eq!(report.revisions, 3);
        assert_eq!(report.head_chain_hash.as_deref(), Some(revisions[2].chain_hash.as_str()));
    }

    #[test]
    fn test_verify_detects_edited_content() {
        let note_id = Uuid::new_v4();
        let mut revisions = chain(note_id, &["a", "b", "c"]);
        revisions[1].content_md = "tampered".to_string();
        let report = verify(note_id, &revisions);
        assert!(!report.valid);
        let brk = report.first_break.unwrap();
        assert_eq!(brk.rev_no, 2);
        assert_eq!(brk.kind, BreakKind::ContentMismatch);
    }

    #[test]
    fn test_verify_detects_rehashed_history() {
        let note_id = Uuid::new_v4();
        let mut revisions = chain(note_id, &["a", "b", "c"]);
        // Rewrite rev 2 consistently with itself; rev 3 still points at the old hash.
        let replacement = ChainLink::next(Some((1, &revisions[0].chain_hash)), "rewritten");
        revisions[1] = revision(note_id, &replacement, "rewritten");
        let report = verify(note_id, &revisions);
        assert_eq!(report.first_break.unwrap().kind, BreakKind::PrevHashMismatch);
    }

    #[test]
    fn test_verify_detects_forged_chain_hash() {
        let note_id = Uuid::new_v4();
        let mut revisions = chain(note_id, &["a", "b", "c"]);
        revisions[2].chain_hash = sha256_hex("forged");
        let brk = verify(note_id, &revisions).first_break.unwrap();
        assert_eq!(brk.rev_no, 3);
        assert_eq!(brk.kind, BreakKind::ChainMismatch);
    }

    #[test]
    fn test_verify_detects_gap() {
        let note_id = Uuid::new_v4();
        let mut revisions = chain(note_id, &["a", "b", "c"]);
        revisions.remove(1);
        let report = verify(note_id, &revisions);
        assert_eq!(report.first_break.unwrap().kind, BreakKind::NumberingGap);
    }

    #[test]
    fn test_verify_empty() {
        let report = verify(Uuid::new_v4(), &[]);
        assert!(report.valid);
        assert_eq!(report.head_chain_hash, None);
    }
}
