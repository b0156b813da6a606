//! Incident endpoints, including vehicles, witnesses, evidence, and the
//! police report with its citations.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, patch, post},
    Router,
};
use uuid::Uuid;

use crate::database::{
    IncidentUpdate, NewCitation, NewEvidence, NewIncident, NewPoliceReport, NewVehicle, NewWitness,
};
use crate::error::AppResult;
use crate::models::{
    Citation, Incident, IncidentEvidence, IncidentVehicle, IncidentWitness, IncidentWithRelations,
    PoliceReport,
};

use super::{AppState, SuccessResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/incidents/cases/:case_id",
            get(get_incident).post(create_incident),
        )
        .route(
            "/incidents/:incident_id",
            patch(update_incident).delete(delete_incident),
        )
        .route("/incidents/:incident_id/vehicles", post(add_vehicle))
        .route("/incidents/vehicles/:vehicle_id", delete(delete_vehicle))
        .route("/incidents/:incident_id/witnesses", post(add_witness))
        .route("/incidents/witnesses/:witness_id", delete(delete_witness))
        .route("/incidents/:incident_id/evidence", post(add_evidence))
        .route("/incidents/evidence/:evidence_id", delete(delete_evidence))
        .route(
            "/incidents/:incident_id/police-report",
            post(create_police_report),
        )
        .route("/police-reports/:report_id/citations", post(add_citation))
}

async fn create_incident(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<NewIncident>,
) -> AppResult<(StatusCode, Json<Incident>)> {
    let incident = state.incidents.create(case_id, payload).await?;
    Ok((StatusCode::CREATED, Json(incident)))
}

async fn get_incident(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<IncidentWithRelations>> {
    Ok(Json(state.incidents.get_for_case(case_id).await?))
}

async fn update_incident(
    State(state): State<AppState>,
    Path(incident_id): Path<Uuid>,
    Json(payload): Json<IncidentUpdate>,
) -> AppResult<Json<IncidentWithRelations>> {
    Ok(Json(state.incidents.update(incident_id, payload).await?))
}

async fn delete_incident(
    State(state): State<AppState>,
    Path(incident_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.incidents.delete(incident_id).await?;
    Ok(Json(SuccessResponse::with_id("incident deleted", incident_id)))
}

async fn add_vehicle(
    State(state): State<AppState>,
    Path(incident_id): Path<Uuid>,
    Json(payload): Json<NewVehicle>,
) -> AppResult<(StatusCode, Json<IncidentVehicle>)> {
    let vehicle = state.incidents.add_vehicle(incident_id, payload).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.incidents.delete_vehicle(vehicle_id).await?;
    Ok(Json(SuccessResponse::new("vehicle removed")))
}

async fn add_witness(
    State(state): State<AppState>,
    Path(incident_id): Path<Uuid>,
    Json(payload): Json<NewWitness>,
) -> AppResult<(StatusCode, Json<IncidentWitness>)> {
    let witness = state.incidents.add_witness(incident_id, payload).await?;
    Ok((StatusCode::CREATED, Json(witness)))
}

async fn delete_witness(
    State(state): State<AppState>,
    Path(witness_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.incidents.delete_witness(witness_id).await?;
    Ok(Json(SuccessResponse::new("witness removed")))
}

async fn add_evidence(
    State(state): State<AppState>,
    Path(incident_id): Path<Uuid>,
    Json(payload): Json<NewEvidence>,
) -> AppResult<(StatusCode, Json<IncidentEvidence>)> {
    let evidence = state.incidents.add_evidence(incident_id, payload).await?;
    Ok((StatusCode::CREATED, Json(evidence)))
}

async fn delete_evidence(
    State(state): State<AppState>,
    Path(evidence_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.incidents.delete_evidence(evidence_id).await?;
    Ok(Json(SuccessResponse::new("evidence removed")))
}

async fn create_police_report(
    State(state): State<AppState>,
    Path(incident_id): Path<Uuid>,
    Json(payload): Json<NewPoliceReport>,
) -> AppResult<(StatusCode, Json<PoliceReport>)> {
    let report = state
        .incidents
        .create_police_report(incident_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn add_citation(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    Json(payload): Json<NewCitation>,
) -> AppResult<(StatusCode, Json<Citation>)> {
    let citation = state.incidents.add_citation(report_id, payload).await?;
    Ok((StatusCode::CREATED, Json(citation)))
}
