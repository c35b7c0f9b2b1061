use std::path::{Path, PathBuf};
use projectnote::config::{default_config_path, ensure_db_dir, resolve_config, write_config, ProjectNoteConfig};
use projectnote::seed::seed_demo;
use projectnote::storage::SqliteStore;
use projectnote::ui::{self, Icons};

/// Config with CLI flags applied on top
fn config_with(path: Option<&Path>, database: Option<PathBuf>) -> anyhow::Result<ProjectNoteConfig> {
    let mut config = resolve_config(path)?;
    if let Some(database) = database {
        config.database = database.to_string_lossy().into_owned();
    }
    Ok(config)
}

fn open_store(config: &ProjectNoteConfig) -> anyhow::Result<SqliteStore> {
    let path = Path::new(&config.database);
    ensure_db_dir(path)?;
    tracing::debug!(database = %path.display(), "Opening database");
    Ok(SqliteStore::open(path)?)
}

pub fn run_serve(path: Option<&Path>, bind: Option<String>, database: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = config_with(path, database)?;
    if let Some(bind) = bind {
        config.bind = bind;
    }
    let store = open_store(&config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(projectnote::server::start_server(config, store))
}

pub fn run_init(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    ui::header(Icons::GEAR, "Writing default configuration");
    write_config(&path, &ProjectNoteConfig::default(), force)?;
    ui::success(&format!("Wrote {}", path.display()));
    Ok(())
}

pub fn run_seed_demo(path: Option<&Path>, database: Option<PathBuf>, reset: bool) -> anyhow::Result<()> {
    let config = config_with(path, database)?;
    let store = open_store(&config)?;

    ui::header(Icons::SEED, "Seeding demo data");
    let report = seed_demo(&store, reset)?;
    if report.skipped {
        ui::warn("Demo data already present, nothing to do (use --reset to start over)");
        return Ok(());
    }
    ui::summary_row("Researchers:", &report.researchers.to_string());
    ui::summary_row("Projects:", &report.projects.to_string());
    ui::summary_row("Notes:", &report.notes.to_string());
    ui::success(&format!("Demo data written to {}", config.database));
    Ok(())
}

pub fn run_stats(path: Option<&Path>, database: Option<PathBuf>) -> anyhow::Result<()> {
    let config = config_with(path, database)?;
    let store = open_store(&config)?;

    ui::header(Icons::STATS, &format!("ProjectNote statistics ({})", config.database));
    let summary = store.dashboard_summary()?;
    ui::summary_row("Organizations:", &summary.organizations.to_string());
    ui::summary_row("Projects:", &summary.projects.to_string());
    ui::summary_row("Notes:", &summary.notes.to_string());
    ui::summary_row("Revisions:", &summary.revisions.to_string());

    ui::section(&format!("{} Tables", Icons::DATABASE));
    println!("{}", ui::table_counts_table(&store.stats()?));
    Ok(())
}

pub fn run_verify(path: Option<&Path>, note: &str, database: Option<PathBuf>) -> anyhow::Result<()> {
    let config = config_with(path, database)?;
    let store = open_store(&config)?;
    let note_id = uuid::Uuid::parse_str(note.trim())
        .map_err(|e| anyhow::anyhow!("invalid note id {note}: {e}"))?;

    let revisions = store.list_revisions(note_id)?;
    let report = store.verify_note(note_id)?;

    ui::header(Icons::NOTE, &format!("Revision chain of {note_id}"));
    if !revisions.is_empty() {
        println!("{}", ui::revisions_table(&revisions));
    }
    ui::info("Revisions", &report.revisions.to_string());
    if let Some(head) = &report.head_chain_hash {
        ui::info("Head", &ui::short_hash(head));
    }

    match &report.first_break {
        None => {
            ui::success(&format!("{} Chain intact", Icons::LINK));
            Ok(())
        }
        Some(broken) => {
            ui::error(&format!(
                "{} Chain broken at revision {} ({:?}) {}",
                Icons::BROKEN,
                broken.rev_no,
                broken.kind,
                ui::dim(&broken.revision_id.to_string())
            ));
            anyhow::bail!("revision chain of note {note_id} failed verification")
        }
    }
}
