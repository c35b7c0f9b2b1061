//! HTTP-level tests driving the full router against an in-memory database.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use projectnote::auth::SuperAdmins;
use projectnote::server::{build_router, AppState};
use projectnote::{build_chain_hash, sha256_hex, ProjectNoteConfig, SqliteStore};
use serde_json::{json, Value};
use tower::ServiceExt;

// ── Test app & request helpers ─────────────────────────────────

fn app() -> Router {
    let config = ProjectNoteConfig::default();
    let store = SqliteStore::open_in_memory().unwrap();
    let admins = SuperAdmins::from_demo(&config);
    build_router(AppState::new(store, config, admins))
}

struct Reply {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }

    fn location(&self) -> &str {
        self.headers[header::LOCATION].to_str().unwrap()
    }
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    Reply { status, headers, body }
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Reply {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> Reply {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn post_form(app: &Router, uri: &str, form: &str, cookie: Option<&str>) -> Reply {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::from(form.to_string())).unwrap()).await
}

/// Sign in and return the `name=value` session cookie
async fn sign_in(app: &Router, username: &str, password: &str) -> String {
    let reply = post_form(app, "/login", &format!("username={username}&password={password}"), None).await;
    assert_eq!(reply.status, StatusCode::FOUND);
    let cookie = reply.headers[header::SET_COOKIE].to_str().unwrap();
    cookie.split(';').next().unwrap().to_string()
}

async fn create_project(app: &Router) -> (String, String) {
    let org = post_json(app, "/api/v1/organizations", json!({"name": "Deep Lab", "code": "DL"})).await;
    assert_eq!(org.status, StatusCode::CREATED);
    let org_id = org.json()["id"].as_str().unwrap().to_string();

    let project = post_json(
        app,
        "/api/v1/projects",
        json!({"org_id": org_id, "name": "Genome study", "code": "GS-1"}),
    )
    .await;
    assert_eq!(project.status, StatusCode::CREATED);
    (org_id, project.json()["id"].as_str().unwrap().to_string())
}

async fn create_note(app: &Router, project_id: &str, content: &str) -> Value {
    let reply = post_json(
        app,
        "/api/v1/notes",
        json!({
            "project_id": project_id,
            "title": "Sequencing run",
            "entry_date": "2026-01-15",
            "content_md": content,
            "content_json": {"blocks": []},
        }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text());
    reply.json()
}

// ── Health ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_and_bootstrap() {
    let app = app();

    let root = get(&app, "/", None).await;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.text(), "ProjectNote backend is running");

    let health = get(&app, "/api/v1/health", None).await;
    assert_eq!(health.json(), json!({"status": "ok"}));

    let bootstrap = get(&app, "/api/v1/frontend/bootstrap", None).await.json();
    assert_eq!(bootstrap["api_name"], "ProjectNote API");
    assert_eq!(bootstrap["api_version"], "v1");
    assert!(bootstrap["timestamp"].is_string());
}

#[tokio::test]
async fn test_dashboard_summary_empty() {
    let app = app();
    let summary = get(&app, "/api/v1/dashboard/summary", None).await;
    assert_eq!(
        summary.json(),
        json!({"organizations": 0, "projects": 0, "notes": 0, "revisions": 0})
    );
}

// ── Users, organizations, projects ─────────────────────────────

#[tokio::test]
async fn test_user_validation_and_conflict() {
    let app = app();

    let bad = post_json(&app, "/api/v1/users", json!({"email": "nope", "full_name": "Kim"})).await;
    assert_eq!(bad.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(bad.json()["detail"][0]["loc"], json!(["body", "email"]));

    let malformed = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/v1/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(malformed.status, StatusCode::UNPROCESSABLE_ENTITY);

    let body = json!({"email": "kim@example.com", "full_name": "Kim"});
    assert_eq!(post_json(&app, "/api/v1/users", body.clone()).await.status, StatusCode::CREATED);
    let dup = post_json(&app, "/api/v1/users", body).await;
    assert_eq!(dup.status, StatusCode::CONFLICT);
    assert_eq!(dup.json()["detail"], "Email already exists");
}

#[tokio::test]
async fn test_organization_and_project_lifecycle() {
    let app = app();
    let (org_id, project_id) = create_project(&app).await;

    let dup = post_json(&app, "/api/v1/organizations", json!({"name": "Other", "code": "DL"})).await;
    assert_eq!(dup.status, StatusCode::CONFLICT);
    assert_eq!(dup.json()["detail"], "Organization code already exists");

    let dup_project = post_json(
        &app,
        "/api/v1/projects",
        json!({"org_id": org_id, "name": "Again", "code": "GS-1"}),
    )
    .await;
    assert_eq!(dup_project.status, StatusCode::CONFLICT);

    let listed = get(&app, &format!("/api/v1/projects?org_id={org_id}"), None).await.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], project_id.as_str());

    let delete = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/organizations/{org_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(delete.status, StatusCode::NO_CONTENT);
    assert_eq!(
        get(&app, &format!("/api/v1/organizations/{org_id}"), None).await.status,
        StatusCode::NOT_FOUND
    );

    let orphan = post_json(&app, "/api/v1/projects", json!({"org_id": org_id, "name": "Late"})).await;
    assert_eq!(orphan.status, StatusCode::NOT_FOUND);
    assert_eq!(orphan.json()["detail"], "Organization not found");
}

#[tokio::test]
async fn test_invalid_org_id_query() {
    let app = app();
    let reply = get(&app, "/api/v1/projects?org_id=not-a-uuid", None).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    let issue = &reply.json()["detail"][0];
    assert_eq!(issue["type"], "uuid_parsing");
    assert_eq!(issue["loc"], json!(["query", "org_id"]));

    let path = get(&app, "/api/v1/notes/not-a-uuid", None).await;
    assert_eq!(path.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_project_management_form() {
    let app = app();

    let researcher = post_form(&app, "/api/v1/researchers", "name=Lee&organization=Bio+Lab", None).await;
    assert_eq!(researcher.status, StatusCode::CREATED);
    let researcher_id = researcher.json()["id"].as_i64().unwrap();
    assert_eq!(researcher.json()["role"], "Researcher");

    let invited_raw = format!(r#"[{{"id":"{researcher_id}","role":"lead"}},{{"id":"999"}}]"#);
    let invited = urlencoding::encode(&invited_raw);
    let reply = post_form(
        &app,
        "/api/v1/project-management",
        &format!("name=Cell+atlas&status=active&start_date=2026-03-01&invited_members={invited}"),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text());
    let project = reply.json();
    assert_eq!(project["manager"], "Unassigned");
    assert_eq!(project["status"], "active");
    assert_eq!(project["start_date"], "2026-03-01");

    let bad_date = post_form(&app, "/api/v1/project-management", "start_date=01-03-2026", None).await;
    assert_eq!(bad_date.status, StatusCode::UNPROCESSABLE_ENTITY);

    let listed = get(&app, "/api/v1/project-management", None).await.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

// ── Notes & revision chain ─────────────────────────────────────

#[tokio::test]
async fn test_note_revision_chain() {
    let app = app();
    let (_, project_id) = create_project(&app).await;
    let note = create_note(&app, &project_id, "first draft").await;
    let note_id = note["id"].as_str().unwrap();
    assert!(note["current_revision_id"].is_string());

    let second = post_json(
        &app,
        &format!("/api/v1/notes/{note_id}/revisions"),
        json!({"content_md": "second draft", "content_json": {"k": 1}}),
    )
    .await;
    assert_eq!(second.status, StatusCode::CREATED);
    let second = second.json();
    assert_eq!(second["rev_no"], 2);

    let revisions = get(&app, &format!("/api/v1/notes/{note_id}/revisions"), None).await.json();
    let revisions = revisions.as_array().unwrap();
    assert_eq!(revisions.len(), 2);

    let first = &revisions[0];
    let content_hash = sha256_hex("first draft");
    assert_eq!(first["prev_hash"], Value::Null);
    assert_eq!(first["content_hash"], content_hash.as_str());
    assert_eq!(first["chain_hash"], build_chain_hash(None, &content_hash).as_str());
    assert_eq!(second["prev_hash"], first["chain_hash"]);

    let report = get(&app, &format!("/api/v1/notes/{note_id}/verify"), None).await.json();
    assert_eq!(report["valid"], true);
    assert_eq!(report["revisions"], 2);
    assert_eq!(report["head_chain_hash"], second["chain_hash"]);

    let summary = get(&app, "/api/v1/dashboard/summary", None).await.json();
    assert_eq!(
        summary,
        json!({"organizations": 1, "projects": 1, "notes": 1, "revisions": 2})
    );
}

#[tokio::test]
async fn test_note_errors() {
    let app = app();
    let missing = create_note_raw(&app, "00000000-0000-0000-0000-000000000000").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.json()["detail"], "Project not found");

    let (_, project_id) = create_project(&app).await;
    let note = create_note(&app, &project_id, "body").await;
    let note_id = note["id"].as_str().unwrap();

    let empty = post_json(
        &app,
        &format!("/api/v1/notes/{note_id}/revisions"),
        json!({"content_md": "", "content_json": {}}),
    )
    .await;
    assert_eq!(empty.status, StatusCode::UNPROCESSABLE_ENTITY);

    let array_body = post_json(
        &app,
        &format!("/api/v1/notes/{note_id}/revisions"),
        json!({"content_md": "draft", "content_json": [1, 2]}),
    )
    .await;
    assert_eq!(array_body.status, StatusCode::UNPROCESSABLE_ENTITY);
    let issue = &array_body.json()["detail"][0];
    assert_eq!(issue["type"], "dict_type");
    assert_eq!(issue["loc"], json!(["body", "content_json"]));

    let delete = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/notes/{note_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(delete.status, StatusCode::NO_CONTENT);

    let after = post_json(
        &app,
        &format!("/api/v1/notes/{note_id}/revisions"),
        json!({"content_md": "late", "content_json": {}}),
    )
    .await;
    assert_eq!(after.status, StatusCode::NOT_FOUND);
}

async fn create_note_raw(app: &Router, project_id: &str) -> Reply {
    post_json(
        app,
        "/api/v1/notes",
        json!({
            "project_id": project_id,
            "title": "t",
            "entry_date": "2026-01-15",
            "content_md": "x",
            "content_json": {},
        }),
    )
    .await
}

#[tokio::test]
async fn test_files_folders_and_cards() {
    let app = app();
    let (_, project_id) = create_project(&app).await;
    let note = create_note(&app, &project_id, "body").await;
    let note_id = note["id"].as_str().unwrap();

    let file = post_json(
        &app,
        &format!("/api/v1/notes/{note_id}/files"),
        json!({"name": "plate.csv", "author": "Lee", "format": "csv"}),
    )
    .await;
    assert_eq!(file.status, StatusCode::CREATED);
    assert_eq!(file.json()["note_revision_id"], note["current_revision_id"]);

    let folder = post_json(&app, &format!("/api/v1/notes/{note_id}/folders"), json!({"name": "raw"})).await;
    assert_eq!(folder.status, StatusCode::CREATED);
    let folders = get(&app, &format!("/api/v1/notes/{note_id}/folders"), None).await.json();
    assert_eq!(folders[0]["name"], "raw");

    let card = get(&app, &format!("/api/v1/research-notes/{note_id}"), None).await.json();
    assert_eq!(card["files"], 1);
    assert_eq!(card["project_code"], "GS-1");

    let updated = post_form(
        &app,
        &format!("/api/v1/research-notes/{note_id}/update"),
        "title=Renamed+run&summary=",
        None,
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    let updated = updated.json();
    assert_eq!(updated["message"], "Research note updated.");
    assert_eq!(updated["note"]["title"], "Renamed run");

    let missing = get(
        &app,
        "/api/v1/research-notes/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.json()["detail"], "Research note not found");
}

#[tokio::test]
async fn test_approval_flow() {
    let app = app();
    let (_, project_id) = create_project(&app).await;
    let note = create_note(&app, &project_id, "body").await;
    let note_id = note["id"].as_str().unwrap();
    let approver = post_json(&app, "/api/v1/users", json!({"email": "pi@example.com", "full_name": "PI"})).await;
    let approver_id = approver.json()["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/notes/{note_id}/revisions/1/approvals");
    let overflow = post_json(&app, &uri, json!({"step_no": 4_294_967_297_u64, "approver_id": approver_id})).await;
    assert_eq!(overflow.status, StatusCode::UNPROCESSABLE_ENTITY);
    let zero = post_json(&app, &uri, json!({"step_no": 0, "approver_id": approver_id})).await;
    assert_eq!(zero.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(zero.json()["detail"][0]["loc"], json!(["body", "step_no"]));

    let bad_rev = post_json(
        &app,
        &format!("/api/v1/notes/{note_id}/revisions/first/approvals"),
        json!({"step_no": 1, "approver_id": approver_id}),
    )
    .await;
    assert_eq!(bad_rev.status, StatusCode::UNPROCESSABLE_ENTITY);
    let issue = &bad_rev.json()["detail"][0];
    assert_eq!(issue["type"], "int_parsing");
    assert_eq!(issue["loc"], json!(["path", "rev_no"]));

    let request = json!({"step_no": 1, "approver_id": approver_id});
    let approval = post_json(&app, &uri, request.clone()).await;
    assert_eq!(approval.status, StatusCode::CREATED);
    let approval = approval.json();
    assert_eq!(approval["status"], "pending");

    assert_eq!(post_json(&app, &uri, request).await.status, StatusCode::CONFLICT);
    let unknown_rev = post_json(
        &app,
        &format!("/api/v1/notes/{note_id}/revisions/9/approvals"),
        json!({"step_no": 1, "approver_id": approver_id}),
    )
    .await;
    assert_eq!(unknown_rev.status, StatusCode::NOT_FOUND);

    let decision_uri = format!("/api/v1/approvals/{}/decision", approval["id"].as_str().unwrap());
    let decided = post_json(&app, &decision_uri, json!({"status": "approved", "comment": "ok"})).await;
    assert_eq!(decided.status, StatusCode::OK);
    assert_eq!(decided.json()["status"], "approved");
    assert!(decided.json()["decided_at"].is_string());

    let again = post_json(&app, &decision_uri, json!({"status": "rejected"})).await;
    assert_eq!(again.status, StatusCode::CONFLICT);
}

// ── Workflow state ─────────────────────────────────────────────

#[tokio::test]
async fn test_data_updates_and_signatures() {
    let app = app();

    let update = post_form(&app, "/api/v1/data-updates", "", None).await;
    assert_eq!(update.status, StatusCode::CREATED);
    let update = update.json();
    assert_eq!(update["target"], "Research data");
    assert_eq!(update["status"], "queued");
    assert!(update["id"].as_str().unwrap().starts_with("upd-"));

    let signature = get(&app, "/api/v1/signatures", None).await.json();
    assert_eq!(signature["status"], "valid");

    let signed = post_form(&app, "/api/v1/signatures", "signed_by=Kim&status=", None).await;
    assert_eq!(signed.status, StatusCode::OK);
    let signed = signed.json();
    assert_eq!(signed["last_signed_by"], "Kim");
    assert_eq!(signed["status"], "valid");

    let download = get(&app, "/api/v1/final-download", None).await.json();
    assert_eq!(download["format"], "pdf");
    assert_eq!(download["status"], "ready");
}

// ── Sessions, pages & admin ────────────────────────────────────

#[tokio::test]
async fn test_pages_require_login() {
    let app = app();

    let page = get(&app, "/frontend/projects", None).await;
    assert_eq!(page.status, StatusCode::FOUND);
    assert!(page.location().starts_with("/login?next="));

    let admin = get(&app, "/api/v1/admin/tables", None).await;
    assert_eq!(admin.status, StatusCode::FOUND);
    assert!(admin.location().starts_with("/login?next="));

    let login = get(&app, "/login?next=/frontend/projects", None).await;
    assert_eq!(login.status, StatusCode::OK);
    assert!(login.text().contains(r#"value="/frontend/projects""#));
}

#[tokio::test]
async fn test_login_session_and_logout() {
    let app = app();

    let untyped = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/login")
            .body(Body::from("username=admin&password=admin1234"))
            .unwrap(),
    )
    .await;
    assert_eq!(untyped.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(untyped.json()["detail"][0]["loc"], json!(["form"]));

    let wrong = post_form(&app, "/login", "username=admin&password=nope", None).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert!(wrong.text().contains("Invalid username or password."));

    let reply = post_form(
        &app,
        "/login",
        "username=admin&password=admin1234&next=%2Ffrontend%2Fresearchers",
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::FOUND);
    assert_eq!(reply.location(), "/frontend/researchers");
    let cookie = reply.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("HttpOnly"));
    let cookie = cookie.split(';').next().unwrap().to_string();

    let page = get(&app, "/frontend/researchers", Some(&cookie)).await;
    assert_eq!(page.status, StatusCode::OK);
    let html = page.text();
    assert!(html.contains("pn-layout"));
    assert!(html.contains("Administrator"));

    let admin = get(&app, "/frontend/admin", Some(&cookie)).await;
    assert_eq!(admin.status, StatusCode::FOUND);
    assert_eq!(admin.location(), "/frontend/admin/dashboard");

    let signed_in_login = get(&app, "/login", Some(&cookie)).await;
    assert_eq!(signed_in_login.location(), "/frontend/workflows");

    let logout = get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(logout.status, StatusCode::FOUND);
    assert_eq!(logout.location(), "/login");

    let after = get(&app, "/frontend/workflows", Some(&cookie)).await;
    assert_eq!(after.status, StatusCode::FOUND);
}

#[tokio::test]
async fn test_external_next_is_ignored() {
    let app = app();
    let reply = post_form(
        &app,
        "/login",
        "username=admin&password=admin1234&next=https%3A%2F%2Fevil.example",
        None,
    )
    .await;
    assert_eq!(reply.location(), "/frontend/workflows");
}

#[tokio::test]
async fn test_my_page_signature() {
    let app = app();
    let cookie = sign_in(&app, "admin", "admin1234").await;

    let invalid = post_form(&app, "/frontend/my-page/signature", "signature_data_url=invalid", Some(&cookie)).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert!(invalid.json()["message"].is_string());

    let valid = post_form(
        &app,
        "/frontend/my-page/signature",
        "signature_data_url=data%3Aimage%2Fpng%3Bbase64%2CiVBORw0KGgo",
        Some(&cookie),
    )
    .await;
    assert_eq!(valid.status, StatusCode::OK);
    assert_eq!(valid.json()["message"], "Signature updated.");

    let page = get(&app, "/frontend/my-page", Some(&cookie)).await;
    assert!(page.text().contains("data:image/png;base64,iVBORw0KGgo"));
}

#[tokio::test]
async fn test_pages_render_with_data() {
    let app = app();
    let (_, project_id) = create_project(&app).await;
    let note = create_note(&app, &project_id, "# <Heading>").await;
    let note_id = note["id"].as_str().unwrap();
    let cookie = sign_in(&app, "admin", "admin1234").await;

    for uri in [
        "/frontend/workflows".to_string(),
        "/frontend/projects".to_string(),
        "/frontend/projects/create".to_string(),
        format!("/frontend/projects/{project_id}"),
        "/frontend/researchers".to_string(),
        "/frontend/data-updates".to_string(),
        "/frontend/final-download".to_string(),
        "/frontend/signatures".to_string(),
        "/frontend/research-notes".to_string(),
        format!("/frontend/research-notes/{note_id}"),
        "/frontend/admin/dashboard".to_string(),
        "/frontend/admin/teams".to_string(),
        "/frontend/admin/users".to_string(),
        "/frontend/admin/tables".to_string(),
    ] {
        let page = get(&app, &uri, Some(&cookie)).await;
        assert_eq!(page.status, StatusCode::OK, "{uri}");
        assert!(page.text().contains("pn-layout"), "{uri}");
    }

    let viewer = get(&app, &format!("/frontend/research-notes/{note_id}/viewer"), Some(&cookie)).await;
    let html = viewer.text();
    assert!(html.contains("# &lt;Heading&gt;"));
    assert!(!html.contains("<Heading>"));

    let missing = get(
        &app,
        "/frontend/projects/00000000-0000-0000-0000-000000000000",
        Some(&cookie),
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signup_and_member_login() {
    let app = app();

    let admin = post_form(
        &app,
        "/api/v1/signup",
        "username=lead&display_name=Lead&email=lead%40example.com&password=pw1&role=admin&team_name=Bio+Lab",
        None,
    )
    .await;
    assert_eq!(admin.status, StatusCode::CREATED, "{}", admin.text());
    let code = admin.json()["joined_team"]["join_code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    let member = post_form(
        &app,
        "/api/v1/signup",
        &format!("username=kim&display_name=Kim&email=kim%40example.com&password=pw2&team_code={code}"),
        None,
    )
    .await;
    assert_eq!(member.status, StatusCode::CREATED);
    assert_eq!(member.json()["team"], "Bio Lab");

    let dup = post_form(
        &app,
        "/api/v1/signup",
        "username=kim&display_name=K&email=other%40example.com&password=pw",
        None,
    )
    .await;
    assert_eq!(dup.status, StatusCode::BAD_REQUEST);

    let unknown = post_form(
        &app,
        "/api/v1/signup",
        "username=park&display_name=P&email=park%40example.com&password=pw&team_code=000000",
        None,
    )
    .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    let missing = post_form(&app, "/api/v1/signup", "username=solo", None).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let cookie = sign_in(&app, "kim", "pw2").await;
    let page = get(&app, "/frontend/my-page", Some(&cookie)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.text().contains("Bio Lab"));
}

#[tokio::test]
async fn test_admin_teams_accounts_and_tables() {
    let app = app();
    let cookie = sign_in(&app, "admin", "admin1234").await;

    let blank = post_form(&app, "/api/v1/admin/teams", "name=+", Some(&cookie)).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let team = post_form(&app, "/api/v1/admin/teams", "name=Core&description=Core+lab", Some(&cookie)).await;
    assert_eq!(team.status, StatusCode::CREATED);
    let team_id = team.json()["id"].as_i64().unwrap();

    let form = format!(
        "username=root&display_name=Root&email=root%40example.com&password=secret&team_id={team_id}"
    );
    let created = post_form(&app, "/api/v1/admin/users", &form, Some(&cookie)).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json()["team"], "Core");
    let second = post_form(&app, "/api/v1/admin/users", &form.replace("root", "root2"), Some(&cookie)).await;
    assert_eq!(second.status, StatusCode::CONFLICT);

    let accounts = get(&app, "/api/v1/admin/users", Some(&cookie)).await.json();
    assert_eq!(accounts.as_array().unwrap().len(), 1);

    let unmanaged = post_form(&app, "/api/v1/admin/tables/users/truncate", "", Some(&cookie)).await;
    assert_eq!(unmanaged.status, StatusCode::BAD_REQUEST);

    post_form(&app, "/api/v1/data-updates", "target=Plate+reads", None).await;
    let truncated = post_form(&app, "/api/v1/admin/tables/data_updates/truncate", "", Some(&cookie)).await;
    assert_eq!(truncated.status, StatusCode::OK);
    assert!(truncated.json()["message"].as_str().unwrap().contains("data_updates"));

    let tables = get(&app, "/api/v1/admin/tables", Some(&cookie)).await.json();
    let data_updates = tables
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["table"] == "data_updates")
        .unwrap();
    assert_eq!(data_updates["rows"], 0);

    let teams = post_form(&app, "/api/v1/admin/tables/teams/truncate", "", Some(&cookie)).await;
    assert_eq!(teams.status, StatusCode::OK);
    let accounts = get(&app, "/api/v1/admin/users", Some(&cookie)).await.json();
    assert!(accounts.as_array().unwrap().is_empty());
}
