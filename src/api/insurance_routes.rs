//! Insurance endpoints: policies, claims, the case summary, and the
//! coverage analysis.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
    Router,
};
use uuid::Uuid;

use crate::database::{ClaimUpdate, NewClaim, NewPolicy, PolicyUpdate};
use crate::error::AppResult;
use crate::models::{
    CoverageAnalysis, InsuranceClaim, InsurancePolicy, InsuranceSummary, PolicyWithClaims,
};

use super::{AppState, SuccessResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/insurance/cases/:case_id/policies",
            get(list_policies).post(create_policy),
        )
        .route(
            "/insurance/policies/:policy_id",
            patch(update_policy).delete(delete_policy),
        )
        .route("/insurance/policies/:policy_id/claims", axum::routing::post(create_claim))
        .route(
            "/insurance/claims/:claim_id",
            patch(update_claim).delete(delete_claim),
        )
        .route("/insurance/cases/:case_id/summary", get(insurance_summary))
        .route(
            "/insurance/cases/:case_id/coverage-analysis",
            get(coverage_analysis),
        )
}

async fn create_policy(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<NewPolicy>,
) -> AppResult<(StatusCode, Json<InsurancePolicy>)> {
    let policy = state.insurance.create_policy(case_id, payload).await?;
    Ok((StatusCode::CREATED, Json(policy)))
}

async fn list_policies(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<Vec<PolicyWithClaims>>> {
    Ok(Json(state.insurance.list_policies(case_id).await?))
}

async fn update_policy(
    State(state): State<AppState>,
    Path(policy_id): Path<Uuid>,
    Json(payload): Json<PolicyUpdate>,
) -> AppResult<Json<InsurancePolicy>> {
    Ok(Json(state.insurance.update_policy(policy_id, payload).await?))
}

async fn delete_policy(
    State(state): State<AppState>,
    Path(policy_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.insurance.delete_policy(policy_id).await?;
    Ok(Json(SuccessResponse::with_id("policy deleted", policy_id)))
}

async fn create_claim(
    State(state): State<AppState>,
    Path(policy_id): Path<Uuid>,
    Json(payload): Json<NewClaim>,
) -> AppResult<(StatusCode, Json<InsuranceClaim>)> {
    let claim = state.insurance.create_claim(policy_id, payload).await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

async fn update_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<Uuid>,
    Json(payload): Json<ClaimUpdate>,
) -> AppResult<Json<InsuranceClaim>> {
    Ok(Json(state.insurance.update_claim(claim_id, payload).await?))
}

async fn delete_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.insurance.delete_claim(claim_id).await?;
    Ok(Json(SuccessResponse::new("claim deleted")))
}

async fn insurance_summary(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<InsuranceSummary>> {
    Ok(Json(state.insurance.summary(case_id).await?))
}

async fn coverage_analysis(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<CoverageAnalysis>> {
    Ok(Json(state.insurance.coverage_analysis(case_id).await?))
}
