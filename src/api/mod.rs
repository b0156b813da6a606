//! REST API surface: per-entity route modules and router assembly.

use std::path::Path;

use axum::{middleware, response::Json, routing::get, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::auth;
use crate::database::{
    CaseService, ClientService, DocumentService, IncidentService, InsuranceService, MedicalService,
};

pub mod case_routes;
pub mod client_routes;
pub mod document_routes;
pub mod incident_routes;
pub mod insurance_routes;
pub mod medical_routes;

/// Shared handler state: one service per entity, each holding a clone of the
/// connection pool.
#[derive(Clone)]
pub struct AppState {
    pub clients: ClientService,
    pub cases: CaseService,
    pub incidents: IncidentService,
    pub medical: MedicalService,
    pub insurance: InsuranceService,
    pub documents: DocumentService,
}

/// Confirmation body for delete endpoints.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: None,
        }
    }

    pub fn with_id(message: impl Into<String>, id: Uuid) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: Some(id),
        }
    }
}

/// Build the full application router. Everything under `/api` except the
/// health check sits behind the bearer guard; uploads are served statically.
pub fn app_router(state: AppState, upload_dir: &Path) -> Router {
    let api = Router::new()
        .merge(client_routes::router())
        .merge(case_routes::router())
        .merge(incident_routes::router())
        .merge(medical_routes::router())
        .merge(insurance_routes::router())
        .merge(document_routes::router())
        .route_layer(middleware::from_fn(auth::require_bearer))
        .route("/health", get(health))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

async fn health() -> Json<SuccessResponse> {
    Json(SuccessResponse::new("OK"))
}
