//! Medical endpoints: providers, records, injuries, and the case-level
//! medical summary.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
    Router,
};
use uuid::Uuid;

use crate::database::{
    InjuryUpdate, NewInjury, NewProvider, NewRecord, ProviderUpdate, RecordUpdate,
};
use crate::error::AppResult;
use crate::models::{
    Injury, MedicalProvider, MedicalRecord, MedicalSummary, ProviderWithRecords,
};

use super::{AppState, SuccessResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/medical/cases/:case_id/providers",
            get(list_providers).post(create_provider),
        )
        .route(
            "/medical/providers/:provider_id",
            get(get_provider).patch(update_provider).delete(delete_provider),
        )
        .route(
            "/medical/cases/:case_id/records",
            get(list_records).post(create_record),
        )
        .route(
            "/medical/records/:record_id",
            patch(update_record).delete(delete_record),
        )
        .route(
            "/medical/cases/:case_id/injuries",
            get(list_injuries).post(create_injury),
        )
        .route(
            "/medical/injuries/:injury_id",
            patch(update_injury).delete(delete_injury),
        )
        .route("/medical/cases/:case_id/summary", get(medical_summary))
}

async fn create_provider(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<NewProvider>,
) -> AppResult<(StatusCode, Json<MedicalProvider>)> {
    let provider = state.medical.create_provider(case_id, payload).await?;
    Ok((StatusCode::CREATED, Json(provider)))
}

async fn list_providers(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<Vec<ProviderWithRecords>>> {
    Ok(Json(state.medical.list_providers(case_id).await?))
}

async fn get_provider(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
) -> AppResult<Json<ProviderWithRecords>> {
    Ok(Json(state.medical.get_provider(provider_id).await?))
}

async fn update_provider(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
    Json(payload): Json<ProviderUpdate>,
) -> AppResult<Json<MedicalProvider>> {
    Ok(Json(state.medical.update_provider(provider_id, payload).await?))
}

async fn delete_provider(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.medical.delete_provider(provider_id).await?;
    Ok(Json(SuccessResponse::with_id("provider deleted", provider_id)))
}

async fn create_record(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<NewRecord>,
) -> AppResult<(StatusCode, Json<MedicalRecord>)> {
    let record = state.medical.create_record(case_id, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_records(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<Vec<MedicalRecord>>> {
    Ok(Json(state.medical.list_records(case_id).await?))
}

async fn update_record(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    Json(payload): Json<RecordUpdate>,
) -> AppResult<Json<MedicalRecord>> {
    Ok(Json(state.medical.update_record(record_id, payload).await?))
}

async fn delete_record(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.medical.delete_record(record_id).await?;
    Ok(Json(SuccessResponse::new("record deleted")))
}

async fn create_injury(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<NewInjury>,
) -> AppResult<(StatusCode, Json<Injury>)> {
    let injury = state.medical.create_injury(case_id, payload).await?;
    Ok((StatusCode::CREATED, Json(injury)))
}

async fn list_injuries(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<Vec<Injury>>> {
    Ok(Json(state.medical.list_injuries(case_id).await?))
}

async fn update_injury(
    State(state): State<AppState>,
    Path(injury_id): Path<Uuid>,
    Json(payload): Json<InjuryUpdate>,
) -> AppResult<Json<Injury>> {
    Ok(Json(state.medical.update_injury(injury_id, payload).await?))
}

async fn delete_injury(
    State(state): State<AppState>,
    Path(injury_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.medical.delete_injury(injury_id).await?;
    Ok(Json(SuccessResponse::new("injury deleted")))
}

async fn medical_summary(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<MedicalSummary>> {
    Ok(Json(state.medical.summary(case_id).await?))
}
