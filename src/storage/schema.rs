//! Database schema definitions

pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    organization_id TEXT REFERENCES organizations(id),
    status TEXT NOT NULL DEFAULT 'active',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

pub const CREATE_ORGANIZATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS organizations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    code TEXT UNIQUE,
    status TEXT NOT NULL DEFAULT 'active',
    created_by TEXT,
    admin_user_id TEXT UNIQUE REFERENCES users(id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
)
"#;

/// Projects created from the JSON API carry an org_id; form-created ones may not.
pub const CREATE_PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    org_id TEXT REFERENCES organizations(id),
    name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    manager TEXT NOT NULL DEFAULT '',
    organization TEXT NOT NULL DEFAULT '',
    code TEXT,
    pi_name TEXT,
    description TEXT NOT NULL DEFAULT '',
    duration_months INTEGER,
    start_date TEXT,
    end_date TEXT,
    created_by TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    UNIQUE(org_id, code)
)
"#;

pub const CREATE_RESEARCHERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS researchers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    role TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    organization TEXT NOT NULL,
    major TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active'
)
"#;

pub const CREATE_PROJECT_MEMBERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS project_members (
    project_id TEXT NOT NULL REFERENCES projects(id),
    researcher_id INTEGER NOT NULL REFERENCES researchers(id),
    role TEXT NOT NULL DEFAULT 'member',
    contribution TEXT,
    PRIMARY KEY (project_id, researcher_id)
)
"#;

/// current_revision_id is maintained by the revision writers, not by a foreign key
pub const CREATE_RESEARCH_NOTES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS research_notes (
    id TEXT PRIMARY KEY,
    project_id TEXT REFERENCES projects(id),
    title TEXT NOT NULL,
    entry_date TEXT,
    owner TEXT NOT NULL DEFAULT '',
    period TEXT NOT NULL DEFAULT '',
    summary TEXT NOT NULL DEFAULT '',
    created_by TEXT,
    current_revision_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
)
"#;

pub const CREATE_NOTE_REVISIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS note_revisions (
    id TEXT PRIMARY KEY,
    note_id TEXT NOT NULL REFERENCES research_notes(id),
    rev_no INTEGER NOT NULL,
    content_md TEXT NOT NULL,
    content_json TEXT NOT NULL,
    prev_hash TEXT,
    content_hash TEXT NOT NULL,
    chain_hash TEXT NOT NULL,
    created_by TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(note_id, rev_no)
)
"#;

pub const CREATE_NOTE_FILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS note_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_id TEXT NOT NULL REFERENCES research_notes(id),
    note_revision_id TEXT REFERENCES note_revisions(id),
    name TEXT NOT NULL,
    author TEXT NOT NULL,
    format TEXT NOT NULL,
    created_label TEXT NOT NULL DEFAULT '',
    role TEXT NOT NULL DEFAULT 'attachment'
)
"#;

pub const CREATE_NOTE_FOLDERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS note_folders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_id TEXT NOT NULL REFERENCES research_notes(id),
    name TEXT NOT NULL
)
"#;

pub const CREATE_APPROVALS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS approvals (
    id TEXT PRIMARY KEY,
    note_revision_id TEXT NOT NULL REFERENCES note_revisions(id),
    step_no INTEGER NOT NULL,
    approver_id TEXT NOT NULL REFERENCES users(id),
    status TEXT NOT NULL DEFAULT 'pending',
    comment TEXT,
    decided_at TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(note_revision_id, step_no)
)
"#;

pub const CREATE_DATA_UPDATES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS data_updates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    target TEXT NOT NULL,
    status TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

pub const CREATE_SIGNATURE_STATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS signature_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    last_signed_by TEXT NOT NULL DEFAULT '',
    last_signed_at TEXT,
    status TEXT NOT NULL DEFAULT 'valid',
    updated_at TEXT NOT NULL
)
"#;

pub const CREATE_TEAMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    join_code TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
)
"#;

pub const CREATE_ADMIN_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS admin_accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    team_id INTEGER REFERENCES teams(id),
    is_super_admin INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
)
"#;

pub const CREATE_USER_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user_accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'member',
    team_id INTEGER REFERENCES teams(id),
    created_at TEXT NOT NULL
)
"#;

pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_projects_org ON projects(org_id)",
    "CREATE INDEX IF NOT EXISTS idx_notes_project ON research_notes(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_revisions_note ON note_revisions(note_id)",
    "CREATE INDEX IF NOT EXISTS idx_files_note ON note_files(note_id)",
    "CREATE INDEX IF NOT EXISTS idx_folders_note ON note_folders(note_id)",
    "CREATE INDEX IF NOT EXISTS idx_members_researcher ON project_members(researcher_id)",
];

/// Tables the admin screens may inspect and truncate.
pub const MANAGED_TABLES: &[&str] = &[
    "teams",
    "admin_accounts",
    "user_accounts",
    "projects",
    "researchers",
    "project_members",
    "research_notes",
    "note_revisions",
    "note_files",
    "note_folders",
    "approvals",
    "data_updates",
    "signature_state",
];

/// Every table, in an order that deletes children before parents.
pub const ALL_TABLES: &[&str] = &[
    "approvals",
    "note_files",
    "note_folders",
    "note_revisions",
    "research_notes",
    "project_members",
    "projects",
    "researchers",
    "data_updates",
    "signature_state",
    "admin_accounts",
    "user_accounts",
    "teams",
    "organizations",
    "users",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_USERS_TABLE,
        CREATE_ORGANIZATIONS_TABLE,
        CREATE_PROJECTS_TABLE,
        CREATE_RESEARCHERS_TABLE,
        CREATE_PROJECT_MEMBERS_TABLE,
        CREATE_RESEARCH_NOTES_TABLE,
        CREATE_NOTE_REVISIONS_TABLE,
        CREATE_NOTE_FILES_TABLE,
        CREATE_NOTE_FOLDERS_TABLE,
        CREATE_APPROVALS_TABLE,
        CREATE_DATA_UPDATES_TABLE,
        CREATE_SIGNATURE_STATE_TABLE,
        CREATE_TEAMS_TABLE,
        CREATE_ADMIN_ACCOUNTS_TABLE,
        CREATE_USER_ACCOUNTS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
