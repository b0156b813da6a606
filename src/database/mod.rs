//! Database connection management and the per-entity services.
//!
//! The pool is built explicitly at process start and cloned into each
//! service; nothing holds a global handle.

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

pub mod case_service;
pub mod client_service;
pub mod document_service;
pub mod incident_service;
pub mod insurance_service;
pub mod medical_service;

pub use case_service::{
    CaseFilter, CaseService, CaseUpdate, NewAssignment, NewCase, NewNote, NewTask, NoteUpdate,
    TaskUpdate,
};
pub use client_service::{ClientFilter, ClientService, ClientUpdate, NewClient, NewContact};
pub use document_service::{DocumentFilter, DocumentService, NewDocument};
pub use incident_service::{
    IncidentService, IncidentUpdate, NewCitation, NewEvidence, NewIncident, NewPoliceReport,
    NewVehicle, NewWitness,
};
pub use insurance_service::{
    ClaimUpdate, InsuranceService, NewClaim, NewPolicy, PolicyUpdate,
};
pub use medical_service::{
    InjuryUpdate, MedicalService, NewInjury, NewProvider, NewRecord, ProviderUpdate, RecordUpdate,
};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost:5432/lexcase".to_string()),
            max_connections: std::env::var("DATABASE_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }
}

/// Owns the connection pool and hands out entity services.
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn new(config: DatabaseConfig) -> Result<Self, sqlx::Error> {
        info!(
            "Connecting to database: {}",
            mask_database_url(&config.database_url)
        );

        let mut pool_options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connection_timeout);

        if let Some(idle_timeout) = config.idle_timeout {
            pool_options = pool_options.idle_timeout(idle_timeout);
        }

        let pool = pool_options
            .connect(&config.database_url)
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                e
            })?;

        info!("Database connection pool created");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn client_service(&self) -> ClientService {
        ClientService::new(self.pool.clone())
    }

    pub fn case_service(&self) -> CaseService {
        CaseService::new(self.pool.clone())
    }

    pub fn incident_service(&self) -> IncidentService {
        IncidentService::new(self.pool.clone())
    }

    pub fn medical_service(&self) -> MedicalService {
        MedicalService::new(self.pool.clone())
    }

    pub fn insurance_service(&self) -> InsuranceService {
        InsuranceService::new(self.pool.clone())
    }

    pub fn document_service(
        &self,
        storage: std::sync::Arc<dyn crate::storage::FileStorage>,
    ) -> DocumentService {
        DocumentService::new(self.pool.clone(), storage)
    }

    /// Apply the schema. Statements are idempotent (`IF NOT EXISTS`), so this
    /// is safe on every start.
    pub async fn apply_schema(&self) -> Result<(), sqlx::Error> {
        info!("Applying database schema");
        sqlx::raw_sql(include_str!("../../migrations/0001_initial.sql"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Test database connectivity.
    pub async fn test_connection(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.map(|_| ())
    }

    pub async fn close(self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }
}

/// Mask credentials in a database URL before logging it.
fn mask_database_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut masked = parsed.clone();
        if parsed.password().is_some() {
            let _ = masked.set_password(Some("***"));
        }
        masked.to_string()
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_password() {
        let masked = mask_database_url("postgresql://app:hunter2@db:5432/lexcase");
        assert!(!masked.contains("hunter2"));
        assert!(masked.contains("app"));
    }

    #[test]
    fn unparseable_url_is_fully_masked() {
        assert_eq!(mask_database_url("not a url"), "***");
    }
}
