use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use crate::auth::SuperAdmins;
use crate::config::ProjectNoteConfig;
use crate::storage::SqliteStore;
use crate::ui::Icons;

pub mod error;
pub mod frontend;
pub mod pages;
pub mod routes;
pub mod session;

pub use error::{ApiError, ApiResult};
pub use session::{CurrentUser, MaybeUser, SessionStore};

/// Server state
pub struct AppState {
    pub store: Mutex<SqliteStore>,
    pub sessions: SessionStore,
    pub config: ProjectNoteConfig,
    pub super_admins: SuperAdmins,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: SqliteStore, config: ProjectNoteConfig, super_admins: SuperAdmins) -> SharedState {
        Arc::new(Self {
            store: Mutex::new(store),
            sessions: SessionStore::new(config.session_ttl()),
            config,
            super_admins,
        })
    }
}

/// Every route the backend serves
pub fn build_router(state: SharedState) -> Router {
    let api = Router::new()
        .route("/health", get(routes::health))
        .route("/frontend/bootstrap", get(routes::bootstrap))
        .route("/dashboard/summary", get(routes::dashboard_summary))
        .route("/users", get(routes::list_users).post(routes::create_user))
        .route("/organizations", get(routes::list_organizations).post(routes::create_organization))
        .route(
            "/organizations/{org_id}",
            get(routes::get_organization).delete(routes::delete_organization),
        )
        .route("/projects", get(routes::list_projects).post(routes::create_project))
        .route(
            "/projects/{project_id}",
            get(routes::get_project).delete(routes::delete_project),
        )
        .route(
            "/project-management",
            get(routes::list_managed_projects).post(routes::create_managed_project),
        )
        .route("/researchers", get(routes::list_researchers).post(routes::create_researcher))
        .route("/notes", post(routes::create_note))
        .route("/notes/{note_id}", get(routes::get_note).delete(routes::delete_note))
        .route(
            "/notes/{note_id}/revisions",
            get(routes::list_revisions).post(routes::append_revision),
        )
        .route("/notes/{note_id}/verify", get(routes::verify_note))
        .route("/notes/{note_id}/files", get(routes::list_note_files).post(routes::add_note_file))
        .route(
            "/notes/{note_id}/folders",
            get(routes::list_note_folders).post(routes::add_note_folder),
        )
        .route(
            "/notes/{note_id}/revisions/{rev_no}/approvals",
            get(routes::list_approvals).post(routes::request_approval),
        )
        .route("/approvals/{approval_id}/decision", post(routes::decide_approval))
        .route("/research-notes", get(routes::list_note_cards))
        .route("/research-notes/{note_id}", get(routes::get_note_card))
        .route("/research-notes/{note_id}/update", post(routes::update_note_card))
        .route("/data-updates", get(routes::list_data_updates).post(routes::create_data_update))
        .route("/final-download", get(routes::final_download))
        .route("/signatures", get(routes::read_signature).post(routes::update_signature))
        .route("/signup", post(frontend::signup))
        .route("/admin/teams", get(routes::list_teams).post(routes::create_team))
        .route("/admin/users", get(routes::list_accounts).post(routes::create_initial_admin))
        .route("/admin/tables", get(routes::list_tables))
        .route("/admin/tables/{table}/truncate", post(routes::truncate_table));

    let pages = Router::new()
        .route("/workflows", get(frontend::workflow_home))
        .route("/admin", get(frontend::admin_home))
        .route("/admin/dashboard", get(frontend::admin_dashboard))
        .route("/admin/teams", get(frontend::admin_teams))
        .route("/admin/users", get(frontend::admin_users))
        .route("/admin/tables", get(frontend::admin_tables))
        .route("/projects", get(frontend::projects))
        .route("/projects/create", get(frontend::project_create))
        .route("/projects/{project_id}", get(frontend::project_detail))
        .route("/researchers", get(frontend::researchers))
        .route("/data-updates", get(frontend::data_updates))
        .route("/final-download", get(frontend::final_download))
        .route("/signatures", get(frontend::signatures))
        .route("/my-page", get(frontend::my_page))
        .route("/my-page/signature", post(frontend::update_my_signature))
        .route("/research-notes", get(frontend::research_notes))
        .route("/research-notes/{note_id}", get(frontend::research_note_detail))
        .route("/research-notes/{note_id}/viewer", get(frontend::research_note_viewer));

    Router::new()
        .route("/", get(routes::root))
        .route("/login", get(frontend::login_page).post(frontend::login))
        .route("/logout", get(frontend::logout))
        .route("/signup", get(frontend::signup_page))
        .nest("/api/v1", api)
        .nest("/frontend", pages)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &ProjectNoteConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub async fn start_server(config: ProjectNoteConfig, store: SqliteStore) -> anyhow::Result<()> {
    let super_admins = SuperAdmins::load(&config)?;
    let addr: SocketAddr = config.bind.parse()?;
    tracing::info!(
        app = %config.app_name,
        environment = %config.environment,
        database = %config.database,
        super_admins = super_admins.len(),
        "Starting server"
    );

    let state = AppState::new(store, config, super_admins);
    let app = build_router(state);

    tracing::info!("Listening on {}", addr);
    println!("{} Server running at http://{}", Icons::GLOBE, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
