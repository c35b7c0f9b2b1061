//! Demo data for local development

use chrono::NaiveDate;
use serde_json::json;
use crate::model::{
    InvitedMember, NewNote, NewNoteFile, NewResearcher, ProjectForm,
};
use crate::storage::SqliteStore;
use crate::Result;

pub const DEMO_PROJECT_CODE: &str = "PN-DEMO";

/// What a seeding run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub skipped: bool,
    pub researchers: usize,
    pub projects: usize,
    pub notes: usize,
}

/// Insert the demo dataset once. With `reset`, wipe every table first.
pub fn seed_demo(store: &SqliteStore, reset: bool) -> Result<SeedReport> {
    if reset {
        tracing::warn!("Clearing all tables before seeding");
        store.clear_all()?;
    }
    let already = store
        .list_projects(None)?
        .iter()
        .any(|p| p.code.as_deref() == Some(DEMO_PROJECT_CODE));
    if already {
        tracing::info!("Demo data already present");
        return Ok(SeedReport {
            skipped: true,
            ..Default::default()
        });
    }

    let lead = store.create_researcher(&researcher(
        "Seo-yeon Park",
        "Principal investigator",
        "park@projectnote.dev",
        "Deep Bio Lab",
        "Molecular biology",
    ))?;
    let analyst = store.create_researcher(&researcher(
        "Min-jun Choi",
        "Data analyst",
        "choi@projectnote.dev",
        "Deep Bio Lab",
        "Bioinformatics",
    ))?;

    let form = ProjectForm {
        name: Some("Demo sequencing study".to_string()),
        manager: Some(lead.name.clone()),
        organization: Some(lead.organization.clone()),
        code: Some(DEMO_PROJECT_CODE.to_string()),
        description: Some("Seeded project for trying out the workflow screens".to_string()),
        start_date: Some("2026-01-05".to_string()),
        end_date: Some("2026-12-18".to_string()),
        status: Some("active".to_string()),
        invited_members: None,
    };
    let (draft, _) = form.into_draft()?;
    let invited = [
        InvitedMember {
            researcher_id: lead.id,
            role: "lead".to_string(),
        },
        InvitedMember {
            researcher_id: analyst.id,
            role: "member".to_string(),
        },
    ];
    let project = store.create_project_with_members(&draft, &invited)?;

    let note = store.create_note(&NewNote {
        project_id: project.id,
        title: "Library prep, batch 1".to_string(),
        entry_date: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap_or_default(),
        content_md: "# Library prep\n\n- 24 samples\n- QC passed on 22".to_string(),
        content_json: json!({"samples": 24, "qc_passed": 22}),
        created_by: None,
        owner: Some(lead.name.clone()),
        period: Some("2026-01".to_string()),
        summary: Some("First library preparation batch".to_string()),
    })?;
    store.add_note_file(
        note.id,
        &NewNoteFile {
            name: "qc-report.pdf".to_string(),
            author: analyst.name.clone(),
            format: "PDF".to_string(),
            created_label: Some("2026-01-12".to_string()),
            rev_no: None,
        },
    )?;
    store.add_note_folder(note.id, "raw-data")?;
    store.create_data_update("Research data", "queued")?;
    store.read_signature()?;

    tracing::info!(project_id = %project.id, note_id = %note.id, "Seeded demo data");
    Ok(SeedReport {
        skipped: false,
        researchers: 2,
        projects: 1,
        notes: 1,
    })
}

fn researcher(name: &str, role: &str, email: &str, organization: &str, major: &str) -> NewResearcher {
    NewResearcher {
        name: Some(name.to_string()),
        role: Some(role.to_string()),
        email: Some(email.to_string()),
        organization: Some(organization.to_string()),
        major: Some(major.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = seed_demo(&store, false).unwrap();
        assert!(!first.skipped);
        assert!(seed_demo(&store, false).unwrap().skipped);

        let summary = store.dashboard_summary().unwrap();
        assert_eq!(summary.projects, 1);
        assert_eq!(summary.notes, 1);
        assert_eq!(summary.revisions, 1);
        assert_eq!(store.list_researchers().unwrap().len(), 2);

        let card = &store.list_note_cards(None).unwrap()[0];
        assert_eq!(card.files, 1);
        assert_eq!(card.members, 2);
        assert_eq!(card.project_code, DEMO_PROJECT_CODE);
    }

    #[test]
    fn test_seed_reset() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed_demo(&store, false).unwrap();
        let report = seed_demo(&store, true).unwrap();
        assert!(!report.skipped);
        assert_eq!(store.list_researchers().unwrap().len(), 2);
        assert_eq!(store.list_data_updates().unwrap().len(), 1);
    }
}
