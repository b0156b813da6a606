//! Client endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::{ClientFilter, ClientUpdate, NewClient};
use crate::error::AppResult;
use crate::models::{Case, Client, ClientWithRelations, StatusCount};
use crate::pagination::{Page, PageParams, DEFAULT_LIMIT};

use super::{AppState, SuccessResponse};

#[derive(Debug, Deserialize)]
pub struct ClientListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub active: Option<bool>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/:client_id",
            get(get_client).patch(update_client).delete(delete_client),
        )
        .route("/clients/:client_id/cases", get(list_client_cases))
        .route("/clients/:client_id/case-summary", get(client_case_summary))
}

async fn create_client(
    State(state): State<AppState>,
    Json(payload): Json<NewClient>,
) -> AppResult<(StatusCode, Json<ClientWithRelations>)> {
    let client = state.clients.create(payload).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientListQuery>,
) -> AppResult<Json<Page<Client>>> {
    let page = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_LIMIT);
    let filter = ClientFilter {
        search: query.search,
        active: query.active,
    };
    Ok(Json(state.clients.list(filter, page).await?))
}

async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> AppResult<Json<ClientWithRelations>> {
    Ok(Json(state.clients.get(client_id).await?))
}

async fn update_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<ClientUpdate>,
) -> AppResult<Json<ClientWithRelations>> {
    Ok(Json(state.clients.update(client_id, payload).await?))
}

async fn delete_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.clients.delete(client_id).await?;
    Ok(Json(SuccessResponse::with_id("client deactivated", client_id)))
}

async fn list_client_cases(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> AppResult<Json<Vec<Case>>> {
    Ok(Json(state.clients.list_cases(client_id).await?))
}

async fn client_case_summary(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> AppResult<Json<Vec<StatusCount>>> {
    Ok(Json(state.clients.case_summary(client_id).await?))
}
