//! Case endpoints: CRUD, assignments, tasks, notes, overview and timeline.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Extension, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::database::{
    CaseFilter, CaseUpdate, NewAssignment, NewCase, NewNote, NewTask, NoteUpdate, TaskUpdate,
};
use crate::error::AppResult;
use crate::models::{
    AssignmentWithUser, Case, CaseNote, CaseOverview, CaseTask, CaseWithRelations, TimelineEntry,
};
use crate::pagination::{Page, PageParams, DEFAULT_LIMIT};

use super::{AppState, SuccessResponse};

#[derive(Debug, Deserialize)]
pub struct CaseListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "caseType")]
    pub case_type: Option<String>,
    #[serde(rename = "clientId")]
    pub client_id: Option<Uuid>,
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<Uuid>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cases", get(list_cases).post(create_case))
        .route(
            "/cases/:case_id",
            get(get_case).patch(update_case).delete(delete_case),
        )
        .route("/cases/:case_id/overview", get(case_overview))
        .route("/cases/:case_id/timeline", get(case_timeline))
        .route("/cases/:case_id/assignments", post(add_assignment))
        .route(
            "/cases/:case_id/assignments/:assignment_id",
            axum::routing::delete(remove_assignment),
        )
        .route("/cases/:case_id/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:task_id", patch(update_task).delete(delete_task))
        .route("/cases/:case_id/notes", get(list_notes).post(create_note))
        .route("/notes/:note_id", patch(update_note).delete(delete_note))
}

async fn create_case(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<NewCase>,
) -> AppResult<(StatusCode, Json<CaseWithRelations>)> {
    let case = state.cases.create(payload, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(case)))
}

async fn list_cases(
    State(state): State<AppState>,
    Query(query): Query<CaseListQuery>,
) -> AppResult<Json<Page<Case>>> {
    let page = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_LIMIT);
    let filter = CaseFilter {
        search: query.search,
        status: query.status,
        case_type: query.case_type,
        client_id: query.client_id,
        assigned_to: query.assigned_to,
    };
    Ok(Json(state.cases.list(filter, page).await?))
}

async fn get_case(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<CaseWithRelations>> {
    Ok(Json(state.cases.get(case_id).await?))
}

async fn update_case(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<CaseUpdate>,
) -> AppResult<Json<CaseWithRelations>> {
    Ok(Json(state.cases.update(case_id, payload).await?))
}

async fn delete_case(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.cases.delete(case_id).await?;
    Ok(Json(SuccessResponse::with_id("case deleted", case_id)))
}

async fn case_overview(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<CaseOverview>> {
    Ok(Json(state.cases.overview(case_id).await?))
}

async fn case_timeline(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<Vec<TimelineEntry>>> {
    Ok(Json(state.cases.timeline(case_id).await?))
}

async fn add_assignment(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<NewAssignment>,
) -> AppResult<(StatusCode, Json<AssignmentWithUser>)> {
    let assignment = state.cases.add_assignment(case_id, payload).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

async fn remove_assignment(
    State(state): State<AppState>,
    Path((case_id, assignment_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<SuccessResponse>> {
    state.cases.remove_assignment(case_id, assignment_id).await?;
    Ok(Json(SuccessResponse::new("assignment removed")))
}

async fn list_tasks(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<Vec<CaseTask>>> {
    Ok(Json(state.cases.list_tasks(case_id).await?))
}

async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<NewTask>,
) -> AppResult<(StatusCode, Json<CaseTask>)> {
    let task = state.cases.create_task(case_id, payload, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<TaskUpdate>,
) -> AppResult<Json<CaseTask>> {
    Ok(Json(state.cases.update_task(task_id, payload).await?))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.cases.delete_task(task_id).await?;
    Ok(Json(SuccessResponse::new("task deleted")))
}

async fn list_notes(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<Vec<CaseNote>>> {
    Ok(Json(state.cases.list_notes(case_id).await?))
}

async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<NewNote>,
) -> AppResult<(StatusCode, Json<CaseNote>)> {
    let note = state.cases.create_note(case_id, payload, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn update_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Json(payload): Json<NoteUpdate>,
) -> AppResult<Json<CaseNote>> {
    Ok(Json(state.cases.update_note(note_id, payload).await?))
}

async fn delete_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.cases.delete_note(note_id).await?;
    Ok(Json(SuccessResponse::new("note deleted")))
}
