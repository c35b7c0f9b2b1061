//! Sign-in flow and the server-rendered workflow/admin pages

use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;
use crate::model::{Registration, Signup};
use crate::validate::parse_uuid;
use crate::Error;
use super::error::ApiResult;
use super::pages;
use super::session::{expired_cookie, found, session_cookie, CurrentUser, MaybeUser};
use super::SharedState;

const HOME: &str = "/frontend/workflows";

/// Only same-site paths are followed after sign-in
fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        next
    } else {
        HOME
    }
}

// ========== Sign-in ==========

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginQuery {
    pub next: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: String,
}

pub async fn login_page(MaybeUser(user): MaybeUser, Query(query): Query<LoginQuery>) -> Response {
    if user.is_some() {
        return found(HOME);
    }
    Html(pages::login_page(&query.next, None)).into_response()
}

pub async fn login(
    State(state): State<SharedState>,
    form: std::result::Result<Form<LoginForm>, FormRejection>,
) -> ApiResult<Response> {
    let Form(form) = form?;
    let username = form.username.trim();
    let account = {
        let store = state.store.lock().await;
        store.find_account_for_login(username, &form.password)?
    };
    let profile = account.or_else(|| state.super_admins.authenticate(username, &form.password));

    let Some(profile) = profile else {
        tracing::info!(username, "Rejected sign-in");
        let page = pages::login_page(&form.next, Some("Invalid username or password."));
        return Ok((StatusCode::UNAUTHORIZED, Html(page)).into_response());
    };

    tracing::info!(username, "Signed in");
    let session_id = state.sessions.create(profile).await;
    let mut response = found(safe_next(&form.next));
    if let Ok(cookie) = session_cookie(&session_id).parse() {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

pub async fn logout(State(state): State<SharedState>, MaybeUser(user): MaybeUser) -> Response {
    if let Some(user) = user {
        state.sessions.remove(&user.session_id).await;
        tracing::info!(username = %user.profile.username, "Signed out");
    }
    let mut response = found("/login");
    if let Ok(cookie) = expired_cookie().parse() {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

pub async fn signup_page() -> Html<String> {
    Html(pages::signup_page())
}

pub async fn signup(
    State(state): State<SharedState>,
    form: std::result::Result<Form<Signup>, FormRejection>,
) -> ApiResult<(StatusCode, Json<Registration>)> {
    let Form(signup) = form?;
    let store = state.store.lock().await;
    let registration = store.register_user(&signup)?;
    tracing::info!(username = %registration.account.username, role = %registration.account.role, "Account registered");
    Ok((StatusCode::CREATED, Json(registration)))
}

// ========== Workflow Pages ==========

pub async fn workflow_home(user: CurrentUser, State(state): State<SharedState>) -> ApiResult<Html<String>> {
    let store = state.store.lock().await;
    let summary = store.dashboard_summary()?;
    let cards = store.list_note_cards(None)?;
    Ok(Html(pages::workflow_home(&user.profile, &summary, &cards)))
}

pub async fn projects(user: CurrentUser, State(state): State<SharedState>) -> ApiResult<Html<String>> {
    let store = state.store.lock().await;
    let projects = store.list_projects(None)?;
    Ok(Html(pages::projects(&user.profile, &projects)))
}

pub async fn project_create(user: CurrentUser, State(state): State<SharedState>) -> ApiResult<Html<String>> {
    let store = state.store.lock().await;
    let groups = store.researcher_groups_for_selection()?;
    Ok(Html(pages::project_create(&user.profile, &groups)))
}

pub async fn project_detail(
    user: CurrentUser,
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> ApiResult<Html<String>> {
    let project_id = parse_uuid("path", "project_id", &project_id)?;
    let store = state.store.lock().await;
    let project = store
        .get_project(project_id)?
        .ok_or_else(|| Error::not_found("Project"))?;
    let notes = store.list_note_cards(Some(project_id))?;
    let groups = store.project_researcher_groups(project_id)?;
    let files = match notes.first() {
        Some(card) => store.list_note_files(card.id)?,
        None => Vec::new(),
    };
    Ok(Html(pages::project_detail(&user.profile, &project, &notes, &groups, &files)))
}

pub async fn researchers(user: CurrentUser, State(state): State<SharedState>) -> ApiResult<Html<String>> {
    let store = state.store.lock().await;
    let researchers = store.list_researchers()?;
    Ok(Html(pages::researchers(&user.profile, &researchers)))
}

pub async fn data_updates(user: CurrentUser, State(state): State<SharedState>) -> ApiResult<Html<String>> {
    let store = state.store.lock().await;
    let updates = store.list_data_updates()?;
    Ok(Html(pages::data_updates(&user.profile, &updates)))
}

pub async fn final_download(user: CurrentUser) -> Html<String> {
    Html(pages::final_download(&user.profile))
}

pub async fn signatures(user: CurrentUser, State(state): State<SharedState>) -> ApiResult<Html<String>> {
    let store = state.store.lock().await;
    let signature = store.read_signature()?;
    Ok(Html(pages::signatures(&user.profile, &signature)))
}

pub async fn my_page(user: CurrentUser) -> Html<String> {
    Html(pages::my_page(&user.profile))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignatureUpload {
    pub signature_data_url: String,
}

/// Store a drawn signature in the session profile
pub async fn update_my_signature(
    user: CurrentUser,
    State(state): State<SharedState>,
    form: std::result::Result<Form<SignatureUpload>, FormRejection>,
) -> ApiResult<Response> {
    let Form(upload) = form?;
    if !upload.signature_data_url.starts_with("data:image/") {
        let body = json!({"message": "Signature must be an image data URL."});
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    let mut profile = user.profile;
    profile.signature_data_url = upload.signature_data_url;
    if !state.sessions.update(&user.session_id, profile).await {
        return Err(Error::Unauthorized("Session expired".to_string()).into());
    }
    Ok(Json(json!({"message": "Signature updated."})).into_response())
}

pub async fn research_notes(user: CurrentUser, State(state): State<SharedState>) -> ApiResult<Html<String>> {
    let store = state.store.lock().await;
    let cards = store.list_note_cards(None)?;
    Ok(Html(pages::research_notes(&user.profile, &cards)))
}

pub async fn research_note_detail(
    user: CurrentUser,
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
) -> ApiResult<Html<String>> {
    let note_id = parse_uuid("path", "note_id", &note_id)?;
    let store = state.store.lock().await;
    let card = store
        .get_note_card(note_id)?
        .ok_or_else(|| Error::not_found("Research note"))?;
    let revisions = store.list_revisions(note_id)?;
    let files = store.list_note_files(note_id)?;
    let folders = store.list_note_folders(note_id)?;
    Ok(Html(pages::research_note_detail(&user.profile, &card, &revisions, &files, &folders)))
}

pub async fn research_note_viewer(
    user: CurrentUser,
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
) -> ApiResult<Html<String>> {
    let note_id = parse_uuid("path", "note_id", &note_id)?;
    let store = state.store.lock().await;
    let card = store
        .get_note_card(note_id)?
        .ok_or_else(|| Error::not_found("Research note"))?;
    let revision = match card.current_rev_no {
        Some(rev_no) => store.get_revision(note_id, rev_no)?,
        None => None,
    };
    Ok(Html(pages::research_note_viewer(&user.profile, &card, revision.as_ref())))
}

// ========== Admin Pages ==========

pub async fn admin_home(_user: CurrentUser) -> Response {
    found("/frontend/admin/dashboard")
}

pub async fn admin_dashboard(user: CurrentUser, State(state): State<SharedState>) -> ApiResult<Html<String>> {
    let store = state.store.lock().await;
    let summary = store.dashboard_summary()?;
    let accounts = store.list_all_accounts()?.len();
    let teams = store.list_teams()?.len();
    Ok(Html(pages::admin_dashboard(&user.profile, &summary, accounts, teams)))
}

pub async fn admin_teams(user: CurrentUser, State(state): State<SharedState>) -> ApiResult<Html<String>> {
    let store = state.store.lock().await;
    let teams = store.list_teams()?;
    Ok(Html(pages::admin_teams(&user.profile, &teams)))
}

pub async fn admin_users(user: CurrentUser, State(state): State<SharedState>) -> ApiResult<Html<String>> {
    let store = state.store.lock().await;
    let accounts = store.list_all_accounts()?;
    let teams = store.list_teams()?;
    Ok(Html(pages::admin_users(&user.profile, &accounts, &teams)))
}

pub async fn admin_tables(user: CurrentUser, State(state): State<SharedState>) -> ApiResult<Html<String>> {
    let store = state.store.lock().await;
    let tables = store.list_managed_tables()?;
    Ok(Html(pages::admin_tables(&user.profile, &tables)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next("/frontend/projects?tab=1"), "/frontend/projects?tab=1");
        assert_eq!(safe_next(""), HOME);
        assert_eq!(safe_next("https://evil.example"), HOME);
        assert_eq!(safe_next("//evil.example"), HOME);
    }
}
