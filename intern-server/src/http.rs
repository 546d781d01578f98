//! Intern Assistant HTTP API
//!
//! Axum server exposing the command router, the content agents and profile,
//! chat and model settings over JSON.
//!
//! Each endpoint has a thin axum handler that delegates to a pub `*_inner`
//! function returning `(StatusCode, serde_json::Value)`; the inner functions
//! are called directly by the tests.
//!
//! Endpoints:
//! - GET  /health, /version
//! - POST /command, /chat/message          : routed free-text messages
//! - POST /notes/organize, /tasks/extract, /meetings/summarize,
//!   /progress/daily, /reports/weekly      : direct agent calls
//! - POST /progress/cache, GET /progress/cache
//! - GET  /chat/history, /chat/sessions
//! - GET  /profiles, POST /profiles, /profiles/switch, /profiles/update
//! - GET  /settings/model, POST /settings/model

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use intern_core::actions::{NoteCategory, ProgressInputs};
use intern_core::error::AssistantError;
use intern_core::models::profile::expand_root;
use intern_core::models::Role;
use intern_core::store::{NewProfile, ProfileUpdate, DAILY_LOGS_STAT};
use intern_core::vault::{display_path, parse_date, resolve_date, today, validate_relative};
use intern_core::{AssistantConfig, CommandRequest, LlmClient, Store, Vault};

use crate::agents::{meeting, notes, progress, progress_message, report, tasks, Agents};
use crate::router;

/// Messages returned by `/chat/history`.
const HISTORY_PAGE: u32 = 200;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub store: Store,
    pub config: AssistantConfig,
    pub llm: LlmClient,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/command", post(command_handler))
        .route("/chat/message", post(command_handler))
        .route("/chat/history", get(history_handler))
        .route("/chat/sessions", get(sessions_handler))
        .route("/notes/organize", post(organize_handler))
        .route("/tasks/extract", post(extract_tasks_handler))
        .route("/meetings/summarize", post(meeting_handler))
        .route("/progress/daily", post(daily_progress_handler))
        .route("/progress/cache", post(cache_update_handler).get(cache_snapshot_handler))
        .route("/reports/weekly", post(weekly_report_handler))
        .route("/profiles", get(list_profiles_handler).post(create_profile_handler))
        .route("/profiles/switch", post(switch_profile_handler))
        .route("/profiles/update", post(update_profile_handler))
        .route("/settings/model", get(get_model_handler).post(set_model_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    store: Store,
    config: AssistantConfig,
    llm: LlmClient,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { store, config, llm });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Intern Assistant HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

fn default_category() -> String {
    "Learning".to_string()
}

#[derive(Debug, Deserialize)]
pub struct OrganizeNoteRequest {
    #[serde(default)]
    pub raw_text: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExtractTasksRequest {
    pub source_text: Option<String>,
    pub note_path: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct MeetingRequest {
    #[serde(default)]
    pub raw_text: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DailyProgressRequest {
    #[serde(default)]
    pub done: Vec<String>,
    #[serde(default)]
    pub blockers: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CacheUpdateRequest {
    #[serde(default)]
    pub text: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct WeeklyReportRequest {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateProfileRequest {
    #[serde(default)]
    pub internship_name: String,
    pub vault_root: Option<String>,
    pub name: Option<String>,
    pub start_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SwitchProfileRequest {
    pub profile_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub profile_id: String,
    #[serde(flatten)]
    pub update: ProfileUpdate,
}

#[derive(Debug, Deserialize, Default)]
pub struct ModelSettingsRequest {
    pub selected_model: Option<String>,
    pub api_key: Option<String>,
}

// ============================================================================
// Error mapping
// ============================================================================

/// Map an error onto the HTTP taxonomy: 404 for missing records, 400 for bad
/// input, 500 with a friendly message for LLM failures, 500 otherwise.
pub fn error_to_http(err: &AssistantError) -> (StatusCode, serde_json::Value) {
    let (status, message) = match err {
        AssistantError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        AssistantError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AssistantError::Llm(e) => {
            tracing::warn!(error = %e, "LLM call failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.friendly_message().to_string())
        }
        other => {
            tracing::error!(error = %other, "Request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    };
    (
        status,
        serde_json::json!({
            "error": message,
            "status": "error",
        }),
    )
}

fn into_http(result: intern_core::error::Result<serde_json::Value>) -> (StatusCode, serde_json::Value) {
    match result {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => error_to_http(&e),
    }
}

fn require_text<'a>(value: &'a str, field: &str) -> intern_core::error::Result<&'a str> {
    match value.trim() {
        "" => Err(AssistantError::Validation(format!("{} is required", field))),
        text => Ok(text),
    }
}

/// The active profile's vault, or the configured default when no profile exists.
pub async fn current_vault(store: &Store, config: &AssistantConfig) -> intern_core::error::Result<Vault> {
    let root = match store.active_profile().await? {
        Some(profile) => profile.vault_path(),
        None => expand_root(&config.vault.default_root),
    };
    Ok(Vault::open(root)?)
}

pub fn welcome_message(name: &str, internship_name: &str) -> String {
    let name = match name.trim() {
        "" => "there",
        n => n,
    };
    format!(
        "Hi {}, I'm ready to help you with your {} internship. You can start by logging today's \
         work, summarizing a meeting, or just talking.",
        name, internship_name
    )
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

pub async fn health_inner(state: &HttpState) -> (StatusCode, serde_json::Value) {
    let sqlite_ver = match intern_core::db::health_check(state.store.pool()).await {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                }),
            );
        }
    };

    let vault_root = match state.store.active_profile().await {
        Ok(Some(profile)) => profile.vault_path(),
        _ => expand_root(&state.config.vault.default_root),
    };
    let daily_logs = state.store.get_stat(DAILY_LOGS_STAT).await.unwrap_or(0);

    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "database": format!("sqlite {}", sqlite_ver),
            "vault_root": vault_root.display().to_string(),
            "daily_logs": daily_logs,
        }),
    )
}

/// Pure, no IO.
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "intern/1",
    })
}

pub async fn command_inner(state: &HttpState, req: CommandRequest) -> (StatusCode, serde_json::Value) {
    match router::handle_message(&state.store, &state.llm, &state.config, req).await {
        Ok(response) => match serde_json::to_value(&response) {
            Ok(body) => (StatusCode::OK, body),
            Err(e) => error_to_http(&e.into()),
        },
        Err(e) => error_to_http(&e),
    }
}

pub async fn organize_inner(state: &HttpState, req: OrganizeNoteRequest) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let raw_text = require_text(&req.raw_text, "raw_text")?;
        let vault = current_vault(&state.store, &state.config).await?;
        let agents = Agents::new(&state.llm, &vault, &state.store);
        let category = NoteCategory::normalize(&req.category);
        let note = notes::organize(&agents, raw_text, category, resolve_date(req.date)).await?;
        Ok(serde_json::json!({
            "status": "ok",
            "note_path": display_path(&note.path),
            "title": note.title,
        }))
    }
    .await)
}

pub async fn extract_tasks_inner(state: &HttpState, req: ExtractTasksRequest) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let given = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());
        if !given(&req.source_text) && !given(&req.note_path) {
            return Err(AssistantError::Validation(
                "source_text or note_path is required".to_string(),
            ));
        }
        let vault = current_vault(&state.store, &state.config).await?;
        let source_text = match (req.source_text.as_deref().map(str::trim), req.note_path.as_deref()) {
            (Some(text), _) if !text.is_empty() => text.to_string(),
            (_, Some(note_path)) if !note_path.trim().is_empty() => {
                let relative = validate_relative(note_path)?;
                vault
                    .read_optional(&relative)?
                    .ok_or_else(|| AssistantError::NotFound(format!("Note {}", display_path(&relative))))?
            }
            _ => String::new(),
        };

        let extracted = tasks::extract_tasks(&state.llm, &source_text).await?;
        let path = tasks::write_tasks(&vault, &extracted, resolve_date(req.date), &[])?;
        Ok(serde_json::json!({
            "status": "ok",
            "task_file": display_path(&path),
            "tasks_created": extracted.len(),
        }))
    }
    .await)
}

pub async fn meeting_inner(state: &HttpState, req: MeetingRequest) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let raw_text = require_text(&req.raw_text, "raw_text")?;
        let vault = current_vault(&state.store, &state.config).await?;
        let agents = Agents::new(&state.llm, &vault, &state.store);
        let outcome = meeting::summarize(&agents, raw_text, resolve_date(req.date)).await?;
        Ok(serde_json::json!({
            "status": "ok",
            "meeting_note_path": display_path(&outcome.meeting_path),
            "tasks_file": display_path(&outcome.tasks_path),
            "tasks_created": outcome.tasks_created,
        }))
    }
    .await)
}

/// With all three lists empty, the inputs come from the day's draft cache.
pub async fn daily_progress_inner(state: &HttpState, req: DailyProgressRequest) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let date = resolve_date(req.date);
        let vault = current_vault(&state.store, &state.config).await?;
        let agents = Agents::new(&state.llm, &vault, &state.store);

        let mut inputs = ProgressInputs {
            done: req.done,
            blockers: req.blockers,
            next_steps: req.next_steps,
        };
        if inputs.done.is_empty() && inputs.blockers.is_empty() && inputs.next_steps.is_empty() {
            inputs = progress::collect_inputs_from_cache(&agents, date).await?;
        }

        let paths = progress::log_daily(&agents, &inputs, date).await?;
        Ok(serde_json::json!({
            "status": "ok",
            "daily_log_path": display_path(&paths.daily),
            "weekly_log_path": display_path(&paths.weekly),
            "message": progress_message(&inputs),
        }))
    }
    .await)
}

pub async fn cache_update_inner(state: &HttpState, req: CacheUpdateRequest) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let text = require_text(&req.text, "text")?;
        let vault = current_vault(&state.store, &state.config).await?;
        let path = progress::cache_daily_update(&vault, text, resolve_date(req.date))?;
        Ok(serde_json::json!({
            "status": "ok",
            "cache_path": display_path(&path),
        }))
    }
    .await)
}

pub async fn cache_snapshot_inner(state: &HttpState, query: DateQuery) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let date = parse_date(query.date.as_deref())?;
        let vault = current_vault(&state.store, &state.config).await?;
        let snapshot = progress::latest_cache_snapshot(&vault, date)?;
        Ok(serde_json::to_value(snapshot)?)
    }
    .await)
}

pub async fn weekly_report_inner(state: &HttpState, req: WeeklyReportRequest) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let vault = current_vault(&state.store, &state.config).await?;
        let agents = Agents::new(&state.llm, &vault, &state.store);
        let report = report::generate_weekly(&agents, resolve_date(req.date)).await?;
        Ok(serde_json::json!({
            "status": "ok",
            "report_path": display_path(&report.path),
            "week_ending": report.week_ending.format("%Y-%m-%d").to_string(),
        }))
    }
    .await)
}

pub async fn history_inner(store: &Store, query: HistoryQuery) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let profile = store
            .active_profile()
            .await?
            .ok_or_else(|| AssistantError::NotFound("Active profile".to_string()))?;
        let session = match query.session_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => store
                .get_session(id)
                .await?
                .filter(|s| s.profile_id == profile.id)
                .ok_or_else(|| AssistantError::NotFound(format!("Session {}", id)))?,
            None => store.get_or_create_daily_session(&profile.id, today()).await?,
        };
        let messages = store.history(&session.id, &profile.id, HISTORY_PAGE).await?;
        Ok(serde_json::json!({
            "session_id": session.id,
            "messages": messages,
        }))
    }
    .await)
}

pub async fn sessions_inner(store: &Store) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let profile = store
            .active_profile()
            .await?
            .ok_or_else(|| AssistantError::NotFound("Active profile".to_string()))?;
        let active = store.get_or_create_daily_session(&profile.id, today()).await?;
        let sessions = store.list_sessions(&profile.id).await?;
        Ok(serde_json::json!({
            "active_session_id": active.id,
            "sessions": sessions,
        }))
    }
    .await)
}

pub async fn list_profiles_inner(store: &Store) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let profiles = store.list_profiles().await?;
        let active = profiles.iter().find(|p| p.active).map(|p| p.id.clone());
        Ok(serde_json::json!({
            "active_profile_id": active,
            "profiles": profiles,
        }))
    }
    .await)
}

/// Create and activate a profile, then greet the user in its daily session.
pub async fn create_profile_inner(
    store: &Store,
    config: &AssistantConfig,
    req: CreateProfileRequest,
) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let vault_root = match req.vault_root.filter(|r| !r.trim().is_empty()) {
            Some(root) => root,
            None => match store.active_profile().await? {
                Some(active) => active.vault_root,
                None => config.vault.default_root.clone(),
            },
        };
        let profile = store
            .create_profile(NewProfile {
                name: req.name.unwrap_or_default(),
                internship_name: req.internship_name,
                start_date: req.start_date.unwrap_or_default(),
                vault_root,
            })
            .await?;
        Vault::open(profile.vault_path())?;

        let session = store.get_or_create_daily_session(&profile.id, today()).await?;
        let welcome = welcome_message(&profile.name, &profile.internship_name);
        store
            .add_message(&session.id, &profile.id, Role::Assistant, &welcome)
            .await?;
        tracing::info!(profile_id = %profile.id, vault_root = %profile.vault_root, "Created profile");

        Ok(serde_json::to_value(profile)?)
    }
    .await)
}

pub async fn switch_profile_inner(store: &Store, req: SwitchProfileRequest) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let profile = store.switch_profile(req.profile_id.trim()).await?;
        tracing::info!(profile_id = %profile.id, "Switched active profile");
        Ok(serde_json::to_value(profile)?)
    }
    .await)
}

pub async fn update_profile_inner(store: &Store, req: UpdateProfileRequest) -> (StatusCode, serde_json::Value) {
    into_http(async {
        let profile = store.update_profile(req.profile_id.trim(), req.update).await?;
        Ok(serde_json::to_value(profile)?)
    }
    .await)
}

async fn model_settings(llm: &LlmClient) -> serde_json::Value {
    serde_json::json!({
        "selected_model": llm.model().await,
        "fallback_model": llm.fallback_model(),
        "api_key_configured": llm.api_key_configured().await,
    })
}

pub async fn get_model_inner(llm: &LlmClient) -> (StatusCode, serde_json::Value) {
    (StatusCode::OK, model_settings(llm).await)
}

pub async fn set_model_inner(llm: &LlmClient, req: ModelSettingsRequest) -> (StatusCode, serde_json::Value) {
    into_http(async {
        if let Some(model) = req.selected_model.as_deref().filter(|m| !m.trim().is_empty()) {
            llm.set_model(model).await?;
            tracing::info!(model = %model.trim(), "Selected model updated");
        }
        if let Some(key) = req.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            llm.set_api_key(key).await?;
            tracing::info!("API key updated");
        }
        Ok(model_settings(llm).await)
    }
    .await)
}

// ============================================================================
// Axum handler wrappers (thin, delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn command_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<CommandRequest>,
) -> impl IntoResponse {
    let (status, body) = command_inner(&state, req).await;
    (status, Json(body))
}

pub async fn organize_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<OrganizeNoteRequest>,
) -> impl IntoResponse {
    let (status, body) = organize_inner(&state, req).await;
    (status, Json(body))
}

pub async fn extract_tasks_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ExtractTasksRequest>,
) -> impl IntoResponse {
    let (status, body) = extract_tasks_inner(&state, req).await;
    (status, Json(body))
}

pub async fn meeting_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<MeetingRequest>,
) -> impl IntoResponse {
    let (status, body) = meeting_inner(&state, req).await;
    (status, Json(body))
}

pub async fn daily_progress_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<DailyProgressRequest>,
) -> impl IntoResponse {
    let (status, body) = daily_progress_inner(&state, req).await;
    (status, Json(body))
}

pub async fn cache_update_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<CacheUpdateRequest>,
) -> impl IntoResponse {
    let (status, body) = cache_update_inner(&state, req).await;
    (status, Json(body))
}

pub async fn cache_snapshot_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<DateQuery>,
) -> impl IntoResponse {
    let (status, body) = cache_snapshot_inner(&state, query).await;
    (status, Json(body))
}

/// The body is optional; an absent or unparseable body means "today".
pub async fn weekly_report_handler(
    State(state): State<Arc<HttpState>>,
    req: Option<Json<WeeklyReportRequest>>,
) -> impl IntoResponse {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let (status, body) = weekly_report_inner(&state, req).await;
    (status, Json(body))
}

pub async fn history_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let (status, body) = history_inner(&state.store, query).await;
    (status, Json(body))
}

pub async fn sessions_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = sessions_inner(&state.store).await;
    (status, Json(body))
}

pub async fn list_profiles_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = list_profiles_inner(&state.store).await;
    (status, Json(body))
}

pub async fn create_profile_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<CreateProfileRequest>,
) -> impl IntoResponse {
    let (status, body) = create_profile_inner(&state.store, &state.config, req).await;
    (status, Json(body))
}

pub async fn switch_profile_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<SwitchProfileRequest>,
) -> impl IntoResponse {
    let (status, body) = switch_profile_inner(&state.store, req).await;
    (status, Json(body))
}

pub async fn update_profile_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    let (status, body) = update_profile_inner(&state.store, req).await;
    (status, Json(body))
}

pub async fn get_model_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = get_model_inner(&state.llm).await;
    (status, Json(body))
}

pub async fn set_model_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ModelSettingsRequest>,
) -> impl IntoResponse {
    let (status, body) = set_model_inner(&state.llm, req).await;
    (status, Json(body))
}

// ============================================================================
// Unit Tests: inner functions and helpers
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use intern_core::llm::LlmError;

    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert!(v["version"].is_string(), "version must be string");
        assert_eq!(v["protocol"], "intern/1");
    }

    #[test]
    fn test_error_to_http_taxonomy() {
        let (status, body) = error_to_http(&AssistantError::NotFound("Profile p-1".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Profile p-1 not found");
        assert_eq!(body["status"], "error");

        let (status, body) = error_to_http(&AssistantError::Validation("text is required".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "text is required");

        let (status, body) = error_to_http(&AssistantError::Llm(LlmError::MissingApiKey));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["error"],
            "The API key was rejected or is missing. Please update it in settings."
        );

        let (status, _) = error_to_http(&AssistantError::Other("boom".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_welcome_message_defaults_name() {
        assert!(welcome_message("", "Compilers").starts_with("Hi there, I'm ready to help you with your Compilers internship."));
        assert!(welcome_message(" Ada ", "Compilers").starts_with("Hi Ada,"));
    }

    #[test]
    fn test_update_request_flattens_profile_fields() {
        let req: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "profile_id": "p-1",
            "start_date": "2026-06-01"
        }))
        .unwrap();
        assert_eq!(req.profile_id, "p-1");
        assert_eq!(req.update.start_date.as_deref(), Some("2026-06-01"));
        assert!(req.update.name.is_none());
    }

    #[test]
    fn test_organize_request_defaults_category() {
        let req: OrganizeNoteRequest = serde_json::from_value(serde_json::json!({"raw_text": "x"})).unwrap();
        assert_eq!(req.category, "Learning");
        assert!(req.date.is_none());
    }
}
