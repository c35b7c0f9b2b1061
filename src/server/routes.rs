//! JSON API handlers under `/api/v1`

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Form, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use crate::chain::ChainReport;
use crate::model::{
    AccountSummary, AdminAccount, Approval, ApprovalDecision, DashboardSummary, DataUpdate,
    NewAdmin, NewApproval, NewNote, NewNoteFile, NewNoteFolder, NewOrganization, NewProject,
    NewResearcher, NewRevision, NewUser, NoteCard, NoteFile, NoteFolder, NoteRevision,
    NoteUpdate, Organization, Project, ProjectForm, ResearchNote, Researcher, SignatureState,
    Team, User,
};
use crate::storage::TableCount;
use crate::validate::{parse_uuid, FieldIssue};
use crate::{Error, Result};
use super::error::ApiResult;
use super::session::CurrentUser;
use super::SharedState;

type Created<T> = (StatusCode, Json<T>);

fn created<T>(value: T) -> Created<T> {
    (StatusCode::CREATED, Json(value))
}

fn path_uuid(field: &str, raw: &str) -> Result<Uuid> {
    parse_uuid("path", field, raw)
}

fn path_rev_no(raw: &str) -> Result<u32> {
    raw.parse().map_err(|_| {
        Error::Validation(vec![FieldIssue::new(
            "int_parsing",
            "path",
            "rev_no",
            "Input should be a valid integer, unable to parse string as an integer",
        )
        .with_input(raw)])
    })
}

// ========== Health ==========

pub async fn root() -> &'static str {
    "ProjectNote backend is running"
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub async fn bootstrap(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "api_name": state.config.app_name,
        "api_version": "v1",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn dashboard_summary(State(state): State<SharedState>) -> ApiResult<Json<DashboardSummary>> {
    let store = state.store.lock().await;
    Ok(Json(store.dashboard_summary()?))
}

// ========== Users & Organizations ==========

pub async fn create_user(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<Created<User>> {
    let Json(new) = payload?;
    new.validate()?;
    let store = state.store.lock().await;
    Ok(created(store.create_user(&new)?))
}

pub async fn list_users(State(state): State<SharedState>) -> ApiResult<Json<Vec<User>>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_users()?))
}

pub async fn create_organization(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<NewOrganization>, JsonRejection>,
) -> ApiResult<Created<Organization>> {
    let Json(new) = payload?;
    new.validate()?;
    let store = state.store.lock().await;
    Ok(created(store.create_organization(&new)?))
}

pub async fn list_organizations(State(state): State<SharedState>) -> ApiResult<Json<Vec<Organization>>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_organizations()?))
}

pub async fn get_organization(
    State(state): State<SharedState>,
    Path(org_id): Path<String>,
) -> ApiResult<Json<Organization>> {
    let org_id = path_uuid("org_id", &org_id)?;
    let store = state.store.lock().await;
    let org = store
        .get_organization(org_id)?
        .ok_or_else(|| Error::not_found("Organization"))?;
    Ok(Json(org))
}

pub async fn delete_organization(
    State(state): State<SharedState>,
    Path(org_id): Path<String>,
) -> ApiResult<StatusCode> {
    let org_id = path_uuid("org_id", &org_id)?;
    let store = state.store.lock().await;
    store.soft_delete_organization(org_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Projects ==========

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub org_id: Option<String>,
}

impl ProjectQuery {
    fn org_id(&self) -> Result<Option<Uuid>> {
        match self.org_id.as_deref().filter(|raw| !raw.is_empty()) {
            Some(raw) => parse_uuid("query", "org_id", raw).map(Some),
            None => Ok(None),
        }
    }
}

pub async fn create_project(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<NewProject>, JsonRejection>,
) -> ApiResult<Created<Project>> {
    let Json(new) = payload?;
    new.validate()?;
    let store = state.store.lock().await;
    Ok(created(store.create_project(&new.into_draft())?))
}

pub async fn list_projects(
    State(state): State<SharedState>,
    query: std::result::Result<Query<ProjectQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Project>>> {
    let Query(query) = query?;
    let org_id = query.org_id()?;
    let store = state.store.lock().await;
    Ok(Json(store.list_projects(org_id)?))
}

pub async fn get_project(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Project>> {
    let project_id = path_uuid("project_id", &project_id)?;
    let store = state.store.lock().await;
    let project = store
        .get_project(project_id)?
        .ok_or_else(|| Error::not_found("Project"))?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> ApiResult<StatusCode> {
    let project_id = path_uuid("project_id", &project_id)?;
    let store = state.store.lock().await;
    store.soft_delete_project(project_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_managed_projects(State(state): State<SharedState>) -> ApiResult<Json<Vec<Project>>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_projects(None)?))
}

pub async fn create_managed_project(
    State(state): State<SharedState>,
    form: std::result::Result<Form<ProjectForm>, FormRejection>,
) -> ApiResult<Created<Project>> {
    let Form(form) = form?;
    let (draft, invited) = form.into_draft()?;
    let store = state.store.lock().await;
    Ok(created(store.create_project_with_members(&draft, &invited)?))
}

// ========== Researchers ==========

pub async fn list_researchers(State(state): State<SharedState>) -> ApiResult<Json<Vec<Researcher>>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_researchers()?))
}

pub async fn create_researcher(
    State(state): State<SharedState>,
    form: std::result::Result<Form<NewResearcher>, FormRejection>,
) -> ApiResult<Created<Researcher>> {
    let Form(new) = form?;
    new.validate()?;
    let store = state.store.lock().await;
    Ok(created(store.create_researcher(&new)?))
}

// ========== Notes & Revisions ==========

pub async fn create_note(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<NewNote>, JsonRejection>,
) -> ApiResult<Created<ResearchNote>> {
    let Json(new) = payload?;
    new.validate()?;
    let store = state.store.lock().await;
    Ok(created(store.create_note(&new)?))
}

pub async fn get_note(
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
) -> ApiResult<Json<ResearchNote>> {
    let note_id = path_uuid("note_id", &note_id)?;
    let store = state.store.lock().await;
    let note = store.get_note(note_id)?.ok_or_else(|| Error::not_found("Note"))?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
) -> ApiResult<StatusCode> {
    let note_id = path_uuid("note_id", &note_id)?;
    let store = state.store.lock().await;
    store.soft_delete_note(note_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn append_revision(
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
    payload: std::result::Result<Json<NewRevision>, JsonRejection>,
) -> ApiResult<Created<NoteRevision>> {
    let note_id = path_uuid("note_id", &note_id)?;
    let Json(new) = payload?;
    new.validate()?;
    let store = state.store.lock().await;
    Ok(created(store.append_revision(note_id, &new)?))
}

pub async fn list_revisions(
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
) -> ApiResult<Json<Vec<NoteRevision>>> {
    let note_id = path_uuid("note_id", &note_id)?;
    let store = state.store.lock().await;
    Ok(Json(store.list_revisions(note_id)?))
}

pub async fn verify_note(
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
) -> ApiResult<Json<ChainReport>> {
    let note_id = path_uuid("note_id", &note_id)?;
    let store = state.store.lock().await;
    Ok(Json(store.verify_note(note_id)?))
}

pub async fn list_note_files(
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
) -> ApiResult<Json<Vec<NoteFile>>> {
    let note_id = path_uuid("note_id", &note_id)?;
    let store = state.store.lock().await;
    if store.get_note(note_id)?.is_none() {
        return Err(Error::not_found("Note").into());
    }
    Ok(Json(store.list_note_files(note_id)?))
}

pub async fn add_note_file(
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
    payload: std::result::Result<Json<NewNoteFile>, JsonRejection>,
) -> ApiResult<Created<NoteFile>> {
    let note_id = path_uuid("note_id", &note_id)?;
    let Json(new) = payload?;
    new.validate()?;
    let store = state.store.lock().await;
    Ok(created(store.add_note_file(note_id, &new)?))
}

pub async fn list_note_folders(
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
) -> ApiResult<Json<Vec<NoteFolder>>> {
    let note_id = path_uuid("note_id", &note_id)?;
    let store = state.store.lock().await;
    if store.get_note(note_id)?.is_none() {
        return Err(Error::not_found("Note").into());
    }
    Ok(Json(store.list_note_folders(note_id)?))
}

pub async fn add_note_folder(
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
    payload: std::result::Result<Json<NewNoteFolder>, JsonRejection>,
) -> ApiResult<Created<NoteFolder>> {
    let note_id = path_uuid("note_id", &note_id)?;
    let Json(new) = payload?;
    new.validate()?;
    let store = state.store.lock().await;
    Ok(created(store.add_note_folder(note_id, new.name.trim())?))
}

// ========== Approvals ==========

pub async fn request_approval(
    State(state): State<SharedState>,
    Path((note_id, rev_no)): Path<(String, String)>,
    payload: std::result::Result<Json<NewApproval>, JsonRejection>,
) -> ApiResult<Created<Approval>> {
    let note_id = path_uuid("note_id", &note_id)?;
    let rev_no = path_rev_no(&rev_no)?;
    let Json(new) = payload?;
    new.validate()?;
    let store = state.store.lock().await;
    Ok(created(store.request_approval(note_id, rev_no, &new)?))
}

pub async fn list_approvals(
    State(state): State<SharedState>,
    Path((note_id, rev_no)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Approval>>> {
    let note_id = path_uuid("note_id", &note_id)?;
    let rev_no = path_rev_no(&rev_no)?;
    let store = state.store.lock().await;
    Ok(Json(store.list_approvals(note_id, rev_no)?))
}

pub async fn decide_approval(
    State(state): State<SharedState>,
    Path(approval_id): Path<String>,
    payload: std::result::Result<Json<ApprovalDecision>, JsonRejection>,
) -> ApiResult<Json<Approval>> {
    let approval_id = path_uuid("approval_id", &approval_id)?;
    let Json(decision) = payload?;
    decision.validate()?;
    let store = state.store.lock().await;
    Ok(Json(store.decide_approval(approval_id, &decision)?))
}

// ========== Note Cards ==========

pub async fn list_note_cards(State(state): State<SharedState>) -> ApiResult<Json<Vec<NoteCard>>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_note_cards(None)?))
}

pub async fn get_note_card(
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
) -> ApiResult<Json<NoteCard>> {
    let note_id = path_uuid("note_id", &note_id)?;
    let store = state.store.lock().await;
    let card = store
        .get_note_card(note_id)?
        .ok_or_else(|| Error::not_found("Research note"))?;
    Ok(Json(card))
}

pub async fn update_note_card(
    State(state): State<SharedState>,
    Path(note_id): Path<String>,
    form: std::result::Result<Form<NoteUpdate>, FormRejection>,
) -> ApiResult<Json<Value>> {
    let note_id = path_uuid("note_id", &note_id)?;
    let Form(update) = form?;
    let store = state.store.lock().await;
    let card = store.update_note(note_id, &update)?;
    Ok(Json(json!({"message": "Research note updated.", "note": card})))
}

// ========== Workflow State ==========

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DataUpdateForm {
    pub target: Option<String>,
    pub status: Option<String>,
}

pub async fn create_data_update(
    State(state): State<SharedState>,
    form: std::result::Result<Form<DataUpdateForm>, FormRejection>,
) -> ApiResult<Created<DataUpdate>> {
    let Form(form) = form?;
    let target = form.target.filter(|t| !t.trim().is_empty());
    let status = form.status.filter(|s| !s.trim().is_empty());
    let store = state.store.lock().await;
    let update = store.create_data_update(
        target.as_deref().unwrap_or("Research data"),
        status.as_deref().unwrap_or("queued"),
    )?;
    Ok(created(update))
}

pub async fn list_data_updates(State(state): State<SharedState>) -> ApiResult<Json<Vec<DataUpdate>>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_data_updates()?))
}

pub async fn final_download() -> Json<Value> {
    Json(json!({
        "format": "pdf",
        "status": "ready",
        "download_url": "/downloads/projectnote-final-report.pdf",
        "generated_at": Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignatureForm {
    pub signed_by: String,
    pub status: String,
}

pub async fn read_signature(State(state): State<SharedState>) -> ApiResult<Json<SignatureState>> {
    let store = state.store.lock().await;
    Ok(Json(store.read_signature()?))
}

pub async fn update_signature(
    State(state): State<SharedState>,
    form: std::result::Result<Form<SignatureForm>, FormRejection>,
) -> ApiResult<Json<SignatureState>> {
    let Form(form) = form?;
    let store = state.store.lock().await;
    Ok(Json(store.update_signature(&form.signed_by, &form.status)?))
}

// ========== Admin ==========

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TeamForm {
    pub name: String,
    pub description: String,
}

pub async fn list_teams(_user: CurrentUser, State(state): State<SharedState>) -> ApiResult<Json<Vec<Team>>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_teams()?))
}

pub async fn create_team(
    _user: CurrentUser,
    State(state): State<SharedState>,
    form: std::result::Result<Form<TeamForm>, FormRejection>,
) -> ApiResult<Created<Team>> {
    let Form(form) = form?;
    let name = form.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Team name is required".to_string()).into());
    }
    let store = state.store.lock().await;
    Ok(created(store.create_team(name, form.description.trim())?))
}

pub async fn list_accounts(
    _user: CurrentUser,
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<AccountSummary>>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_all_accounts()?))
}

pub async fn create_initial_admin(
    _user: CurrentUser,
    State(state): State<SharedState>,
    form: std::result::Result<Form<NewAdmin>, FormRejection>,
) -> ApiResult<Created<AdminAccount>> {
    let Form(new) = form?;
    let store = state.store.lock().await;
    Ok(created(store.create_initial_admin(&new)?))
}

pub async fn list_tables(
    _user: CurrentUser,
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<TableCount>>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_managed_tables()?))
}

pub async fn truncate_table(
    user: CurrentUser,
    State(state): State<SharedState>,
    Path(table): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = state.store.lock().await;
    store.truncate_table(&table)?;
    tracing::warn!(table = %table, by = %user.profile.username, "Table truncated from admin screen");
    Ok(Json(json!({"message": format!("{table} table was cleared.")})))
}
