use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use lexcase::api::{app_router, AppState};
use lexcase::config::AppConfig;
use lexcase::database::{DatabaseConfig, DatabaseManager};
use lexcase::storage::LocalStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lexcase=info,tower_http=debug".into()),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    let manager = DatabaseManager::new(DatabaseConfig {
        database_url: config.database_url.clone(),
        max_connections: config.pool_size,
        connection_timeout: Duration::from_secs(30),
        idle_timeout: Some(Duration::from_secs(600)),
    })
    .await?;
    manager.apply_schema().await?;

    let storage: Arc<dyn lexcase::storage::FileStorage> =
        Arc::new(LocalStorage::new(config.upload_dir.clone()));

    let state = AppState {
        clients: manager.client_service(),
        cases: manager.case_service(),
        incidents: manager.incident_service(),
        medical: manager.medical_service(),
        insurance: manager.insurance_service(),
        documents: manager.document_service(storage),
    };

    let app = app_router(state, &config.upload_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
