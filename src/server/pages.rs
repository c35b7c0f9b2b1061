//! Server-rendered HTML pages
//!
//! Pages are plain `format!` templates. Every value coming from storage or
//! the session goes through [`escape`] before it is interpolated.

use crate::model::{
    AccountSummary, DashboardSummary, DataUpdate, NoteCard, NoteFile, NoteFolder, NoteRevision,
    Project, ResearcherGroup, Researcher, SignatureState, Team, UserProfile,
};
use crate::storage::TableCount;

const CSS: &str = r#"
        body { font-family: system-ui, sans-serif; margin: 0; color: #1f2933; }
        .pn-layout { display: grid; grid-template-columns: 220px 1fr; min-height: 100vh; }
        .pn-nav { background: #102a43; color: #f0f4f8; padding: 20px; }
        .pn-nav a { color: #d9e2ec; display: block; padding: 6px 0; text-decoration: none; }
        .pn-user { border-top: 1px solid #334e68; margin-top: 20px; padding-top: 12px; font-size: 0.9em; }
        .pn-main { padding: 24px 32px; }
        table { border-collapse: collapse; width: 100%; margin: 12px 0; }
        th, td { border-bottom: 1px solid #e4e7eb; padding: 8px; text-align: left; }
        th { background: #f5f7fa; }
        .pn-cards { display: grid; grid-template-columns: repeat(4, 1fr); gap: 12px; }
        .pn-card { border: 1px solid #e4e7eb; border-radius: 6px; padding: 12px; }
        .pn-card strong { display: block; font-size: 1.6em; }
        .pn-error { color: #ab091e; }
        pre { background: #f5f7fa; padding: 12px; white-space: pre-wrap; }
        form label { display: block; margin: 8px 0; }
"#;

/// Escape text for HTML element and attribute contexts
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

fn document(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} · ProjectNote</title>
    <style>{css}</style>
</head>
<body>
{body}
</body>
</html>"#,
        title = escape(title),
        css = CSS,
        body = body,
    )
}

/// Signed-in page: navigation, the current user and `content`
pub fn layout(title: &str, user: &UserProfile, content: &str) -> String {
    let body = format!(
        r#"<div class="pn-layout">
    <nav class="pn-nav">
        <h2>ProjectNote</h2>
        <a href="/frontend/workflows">Workflows</a>
        <a href="/frontend/projects">Projects</a>
        <a href="/frontend/research-notes">Research notes</a>
        <a href="/frontend/researchers">Researchers</a>
        <a href="/frontend/data-updates">Data updates</a>
        <a href="/frontend/signatures">Signatures</a>
        <a href="/frontend/final-download">Final download</a>
        <a href="/frontend/admin/dashboard">Admin</a>
        <div class="pn-user">
            <div class="pn-user-name">{name}</div>
            <div>{role} · {organization}</div>
            <a href="/frontend/my-page">My page</a>
            <a href="/logout">Sign out</a>
        </div>
    </nav>
    <main class="pn-main">
        <h1>{title}</h1>
{content}
    </main>
</div>"#,
        name = escape(&user.name),
        role = escape(&user.role),
        organization = escape(&user.organization),
        title = escape(title),
        content = content,
    );
    document(title, &body)
}

/// `<table>` from escaped header names and pre-rendered cells
fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "<p>Nothing here yet.</p>".to_string();
    }
    let head: String = headers.iter().map(|h| format!("<th>{}</th>", escape(h))).collect();
    let body: String = rows
        .into_iter()
        .map(|cells| {
            let cells: String = cells.into_iter().map(|c| format!("<td>{c}</td>")).collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();
    format!("<table><thead><tr>{head}</tr></thead><tbody>{body}</tbody></table>")
}

fn link(href: &str, text: &str) -> String {
    format!(r#"<a href="{}">{}</a>"#, escape(href), escape(text))
}

fn opt(value: Option<impl ToString>) -> String {
    value.map(|v| escape(&v.to_string())).unwrap_or_else(|| "-".to_string())
}

fn summary_cards(summary: &DashboardSummary) -> String {
    format!(
        r#"<div class="pn-cards">
    <div class="pn-card"><strong>{}</strong>Organizations</div>
    <div class="pn-card"><strong>{}</strong>Projects</div>
    <div class="pn-card"><strong>{}</strong>Notes</div>
    <div class="pn-card"><strong>{}</strong>Revisions</div>
</div>"#,
        summary.organizations, summary.projects, summary.notes, summary.revisions
    )
}

fn note_card_rows(cards: &[NoteCard]) -> String {
    table(
        &["Title", "Owner", "Project", "Period", "Files", "Members", "Updated"],
        cards
            .iter()
            .map(|card| {
                vec![
                    link(&format!("/frontend/research-notes/{}", card.id), &card.title),
                    escape(&card.owner),
                    escape(&card.project_code),
                    escape(&card.period),
                    card.files.to_string(),
                    card.members.to_string(),
                    card.last_updated_at.format("%Y-%m-%d %H:%M").to_string(),
                ]
            })
            .collect(),
    )
}

fn file_rows(files: &[NoteFile]) -> String {
    table(
        &["Name", "Author", "Format", "Created", "Role"],
        files
            .iter()
            .map(|f| {
                vec![
                    escape(&f.name),
                    escape(&f.author),
                    escape(&f.format),
                    escape(&f.created),
                    escape(&f.role),
                ]
            })
            .collect(),
    )
}

fn group_sections(groups: &[ResearcherGroup]) -> String {
    if groups.is_empty() {
        return "<p>No researchers assigned.</p>".to_string();
    }
    groups
        .iter()
        .map(|group| {
            let members = table(
                &["Name", "Role", "Major", "Contribution"],
                group
                    .members
                    .iter()
                    .map(|m| {
                        vec![
                            escape(&m.name),
                            escape(&m.role),
                            escape(&m.major),
                            opt(m.contribution.as_deref()),
                        ]
                    })
                    .collect(),
            );
            format!(
                "<section><h3>{}</h3><p>Lead: {}</p>{members}</section>",
                escape(&group.group),
                escape(&group.lead)
            )
        })
        .collect()
}

// ========== Sign-in ==========

pub fn login_page(next: &str, error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<p class="pn-error">{}</p>"#, escape(e)))
        .unwrap_or_default();
    let body = format!(
        r#"<main class="pn-main">
    <h1>Sign in</h1>
    {error}
    <form method="post" action="/login">
        <input type="hidden" name="next" value="{next}">
        <label>Username <input name="username" autocomplete="username"></label>
        <label>Password <input name="password" type="password" autocomplete="current-password"></label>
        <button type="submit">Sign in</button>
    </form>
    <p>No account yet? <a href="/signup">Sign up</a></p>
</main>"#,
        next = escape(next),
    );
    document("Sign in", &body)
}

pub fn signup_page() -> String {
    let body = r#"<main class="pn-main">
    <h1>Sign up</h1>
    <form method="post" action="/api/v1/signup">
        <label>Username <input name="username"></label>
        <label>Display name <input name="display_name"></label>
        <label>Email <input name="email" type="email"></label>
        <label>Password <input name="password" type="password"></label>
        <label>Role
            <select name="role">
                <option value="member">Member</option>
                <option value="admin">Administrator</option>
            </select>
        </label>
        <label>Team name (administrators) <input name="team_name"></label>
        <label>Team description <input name="team_description"></label>
        <label>Team join code (members) <input name="team_code"></label>
        <button type="submit">Create account</button>
    </form>
    <p><a href="/login">Back to sign in</a></p>
</main>"#;
    document("Sign up", body)
}

// ========== Workflow ==========

pub fn workflow_home(user: &UserProfile, summary: &DashboardSummary, cards: &[NoteCard]) -> String {
    let content = format!(
        "{}<h2>Recently updated notes</h2>{}",
        summary_cards(summary),
        note_card_rows(cards)
    );
    layout("Workflows", user, &content)
}

pub fn projects(user: &UserProfile, projects: &[Project]) -> String {
    let rows = projects
        .iter()
        .map(|p| {
            vec![
                link(&format!("/frontend/projects/{}", p.id), &p.name),
                opt(p.code.as_deref()),
                escape(p.status.as_str()),
                escape(&p.manager),
                escape(&p.organization),
                opt(p.start_date),
                opt(p.end_date),
            ]
        })
        .collect();
    let content = format!(
        r#"<p><a href="/frontend/projects/create">New project</a></p>{}"#,
        table(
            &["Name", "Code", "Status", "Manager", "Organization", "Start", "End"],
            rows
        )
    );
    layout("Projects", user, &content)
}

pub fn project_create(user: &UserProfile, groups: &[ResearcherGroup]) -> String {
    let options: String = groups
        .iter()
        .flat_map(|g| g.members.iter())
        .map(|m| {
            format!(
                r#"<li><label><input type="checkbox" value="{}" data-role="{}"> {} ({})</label></li>"#,
                m.id,
                escape(&m.role),
                escape(&m.name),
                escape(&m.organization)
            )
        })
        .collect();
    let content = format!(
        r#"<form method="post" action="/api/v1/project-management">
    <label>Name <input name="name"></label>
    <label>Manager <input name="manager"></label>
    <label>Organization <input name="organization"></label>
    <label>Code <input name="code"></label>
    <label>Description <textarea name="description"></textarea></label>
    <label>Start date <input name="start_date" type="date"></label>
    <label>End date <input name="end_date" type="date"></label>
    <label>Status
        <select name="status">
            <option value="draft">Draft</option>
            <option value="active">Active</option>
        </select>
    </label>
    <input type="hidden" name="invited_members" value="[]">
    <h3>Invite researchers</h3>
    <ul>{options}</ul>
    <button type="submit">Create project</button>
</form>"#
    );
    layout("New project", user, &content)
}

pub fn project_detail(
    user: &UserProfile,
    project: &Project,
    notes: &[NoteCard],
    groups: &[ResearcherGroup],
    files: &[NoteFile],
) -> String {
    let content = format!(
        r#"<dl>
    <dt>Code</dt><dd>{code}</dd>
    <dt>Status</dt><dd>{status}</dd>
    <dt>Manager</dt><dd>{manager}</dd>
    <dt>Organization</dt><dd>{organization}</dd>
    <dt>Period</dt><dd>{start} ~ {end}</dd>
</dl>
<p>{description}</p>
<h2>Research notes</h2>
{notes}
<h2>Researchers</h2>
{groups}
<h2>Files</h2>
{files}"#,
        code = opt(project.code.as_deref()),
        status = escape(project.status.as_str()),
        manager = escape(&project.manager),
        organization = escape(&project.organization),
        start = opt(project.start_date),
        end = opt(project.end_date),
        description = escape(&project.description),
        notes = note_card_rows(notes),
        groups = group_sections(groups),
        files = file_rows(files),
    );
    layout(&project.name, user, &content)
}

pub fn researchers(user: &UserProfile, researchers: &[Researcher]) -> String {
    let rows = researchers
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                escape(&r.name),
                escape(&r.role),
                escape(&r.email),
                escape(&r.organization),
                escape(&r.major),
                escape(&r.status),
            ]
        })
        .collect();
    let content = format!(
        r#"{}
<h2>Register researcher</h2>
<form method="post" action="/api/v1/researchers">
    <label>Name <input name="name"></label>
    <label>Role <input name="role"></label>
    <label>Email <input name="email" type="email"></label>
    <label>Organization <input name="organization"></label>
    <label>Major <input name="major"></label>
    <button type="submit">Register</button>
</form>"#,
        table(
            &["ID", "Name", "Role", "Email", "Organization", "Major", "Status"],
            rows
        )
    );
    layout("Researchers", user, &content)
}

pub fn data_updates(user: &UserProfile, updates: &[DataUpdate]) -> String {
    let rows = updates
        .iter()
        .map(|u| {
            vec![
                escape(&u.label()),
                escape(&u.target),
                escape(&u.status),
                u.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    layout("Data updates", user, &table(&["ID", "Target", "Status", "Updated"], rows))
}

pub fn final_download(user: &UserProfile) -> String {
    let content = r#"<p>The final report bundles every project, note and revision.</p>
<p><a href="/api/v1/final-download">Prepare PDF report</a></p>"#;
    layout("Final download", user, content)
}

pub fn signatures(user: &UserProfile, signature: &SignatureState) -> String {
    let content = format!(
        r#"<dl>
    <dt>Last signed by</dt><dd>{by}</dd>
    <dt>Signed at</dt><dd>{at}</dd>
    <dt>Status</dt><dd>{status}</dd>
</dl>
<form method="post" action="/api/v1/signatures">
    <label>Signed by <input name="signed_by" value="{name}"></label>
    <label>Status <input name="status" value="valid"></label>
    <button type="submit">Sign</button>
</form>"#,
        by = escape(&signature.last_signed_by),
        at = opt(signature.last_signed_at.map(|t| t.format("%Y-%m-%d %H:%M"))),
        status = escape(&signature.status),
        name = escape(&user.name),
    );
    layout("Signatures", user, &content)
}

pub fn my_page(user: &UserProfile) -> String {
    let signature = if user.signature_data_url.is_empty() {
        "<p>No signature registered.</p>".to_string()
    } else {
        format!(
            r#"<img class="pn-signature" alt="signature" src="{}">"#,
            escape(&user.signature_data_url)
        )
    };
    let content = format!(
        r#"<dl>
    <dt>Username</dt><dd>{username}</dd>
    <dt>Email</dt><dd>{email}</dd>
    <dt>Organization</dt><dd>{organization}</dd>
    <dt>Major</dt><dd>{major}</dd>
</dl>
<h2>Signature</h2>
{signature}
<form method="post" action="/frontend/my-page/signature">
    <label>Signature image (data URL) <textarea name="signature_data_url"></textarea></label>
    <button type="submit">Save signature</button>
</form>"#,
        username = escape(&user.username),
        email = escape(&user.email),
        organization = escape(&user.organization),
        major = escape(&user.major),
    );
    layout("My page", user, &content)
}

pub fn research_notes(user: &UserProfile, cards: &[NoteCard]) -> String {
    layout("Research notes", user, &note_card_rows(cards))
}

pub fn research_note_detail(
    user: &UserProfile,
    card: &NoteCard,
    revisions: &[NoteRevision],
    files: &[NoteFile],
    folders: &[NoteFolder],
) -> String {
    let revision_rows = revisions
        .iter()
        .map(|r| {
            vec![
                r.rev_no.to_string(),
                format!("<code>{}</code>", escape(&r.chain_hash[..r.chain_hash.len().min(16)])),
                r.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    let folder_list: String = folders
        .iter()
        .map(|f| format!("<li>{}</li>", escape(&f.name)))
        .collect();
    let content = format!(
        r#"<p>{summary}</p>
<p>Owner: {owner} · Project: {project} · Period: {period}</p>
<p><a href="/frontend/research-notes/{id}/viewer">Open viewer</a></p>
<form method="post" action="/api/v1/research-notes/{id}/update">
    <label>Title <input name="title" value="{title}"></label>
    <label>Summary <textarea name="summary">{summary}</textarea></label>
    <button type="submit">Save</button>
</form>
<h2>Revisions</h2>
{revisions}
<h2>Folders</h2>
<ul>{folders}</ul>
<h2>Files</h2>
{files}"#,
        id = card.id,
        title = escape(&card.title),
        summary = escape(&card.summary),
        owner = escape(&card.owner),
        project = escape(&card.project_code),
        period = escape(&card.period),
        revisions = table(&["Rev", "Chain hash", "Created"], revision_rows),
        folders = folder_list,
        files = file_rows(files),
    );
    layout(&card.title, user, &content)
}

pub fn research_note_viewer(user: &UserProfile, card: &NoteCard, revision: Option<&NoteRevision>) -> String {
    let content = match revision {
        Some(rev) => format!(
            r#"<p>Revision {rev_no} · {created}</p>
<pre>{body}</pre>
<p>Chain hash <code>{chain}</code></p>"#,
            rev_no = rev.rev_no,
            created = rev.created_at.format("%Y-%m-%d %H:%M"),
            body = escape(&rev.content_md),
            chain = escape(&rev.chain_hash),
        ),
        None => "<p>This note has no revisions.</p>".to_string(),
    };
    layout(&card.title, user, &content)
}

// ========== Admin ==========

pub fn admin_dashboard(user: &UserProfile, summary: &DashboardSummary, accounts: usize, teams: usize) -> String {
    let content = format!(
        r#"{}
<p>{accounts} accounts in {teams} teams.</p>
<p><a href="/frontend/admin/teams">Teams</a> · <a href="/frontend/admin/users">Accounts</a> · <a href="/frontend/admin/tables">Tables</a></p>"#,
        summary_cards(summary)
    );
    layout("Admin dashboard", user, &content)
}

pub fn admin_teams(user: &UserProfile, teams: &[Team]) -> String {
    let rows = teams
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                escape(&t.name),
                escape(&t.description),
                format!("<code>{}</code>", escape(&t.join_code)),
            ]
        })
        .collect();
    let content = format!(
        r#"{}
<form method="post" action="/api/v1/admin/teams">
    <label>Name <input name="name"></label>
    <label>Description <input name="description"></label>
    <button type="submit">Create team</button>
</form>"#,
        table(&["ID", "Name", "Description", "Join code"], rows)
    );
    layout("Teams", user, &content)
}

pub fn admin_users(user: &UserProfile, accounts: &[AccountSummary], teams: &[Team]) -> String {
    let rows = accounts
        .iter()
        .map(|a| {
            vec![
                escape(a.kind),
                escape(&a.username),
                escape(&a.display_name),
                escape(&a.email),
                escape(&a.role),
                opt(a.team.as_deref()),
            ]
        })
        .collect();
    let team_options: String = teams
        .iter()
        .map(|t| format!(r#"<option value="{}">{}</option>"#, t.id, escape(&t.name)))
        .collect();
    let content = format!(
        r#"{}
<h2>Initial administrator</h2>
<form method="post" action="/api/v1/admin/users">
    <label>Username <input name="username"></label>
    <label>Display name <input name="display_name"></label>
    <label>Email <input name="email" type="email"></label>
    <label>Password <input name="password" type="password"></label>
    <label>Team <select name="team_id"><option value="">None</option>{team_options}</select></label>
    <button type="submit">Create</button>
</form>"#,
        table(&["Kind", "Username", "Name", "Email", "Role", "Team"], rows)
    );
    layout("Accounts", user, &content)
}

pub fn admin_tables(user: &UserProfile, tables: &[TableCount]) -> String {
    let rows = tables
        .iter()
        .map(|t| {
            vec![
                escape(&t.table),
                t.rows.to_string(),
                format!(
                    r#"<form method="post" action="/api/v1/admin/tables/{}/truncate"><button type="submit">Truncate</button></form>"#,
                    escape(&t.table)
                ),
            ]
        })
        .collect();
    layout("Tables", user, &table(&["Table", "Rows", ""], rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserProfile {
        UserProfile {
            username: "kim".into(),
            name: "Kim <b>".into(),
            role: "Lead".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#x27;y&#x27;)&lt;/script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_layout_shows_escaped_user() {
        let html = layout("Home", &user(), "<p>ok</p>");
        assert!(html.contains(r#"class="pn-layout""#));
        assert!(html.contains("Kim &lt;b&gt;"));
        assert!(!html.contains("Kim <b>"));
        assert!(html.contains("<p>ok</p>"));
    }

    #[test]
    fn test_login_page_keeps_next() {
        let html = login_page("/frontend/projects?a=1&b=2", Some("Invalid credentials"));
        assert!(html.contains(r#"value="/frontend/projects?a=1&amp;b=2""#));
        assert!(html.contains("Invalid credentials"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(table(&["A"], vec![]), "<p>Nothing here yet.</p>");
    }
}
