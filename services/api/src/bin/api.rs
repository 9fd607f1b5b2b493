//! services/api/src/bin/api.rs

use agro_shop_core::memory::InMemoryDatabase;
use agro_shop_core::ports::{DatabaseService, NotificationService};
use api_lib::{
    adapters::{DbAdapter, LogMailer, QrPaymentAdapter, SmtpMailer},
    config::{Config, StorageBackend},
    error::ApiError,
    web::{build_router, state::AppState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Storage & Run Migrations ---
    let db: Arc<dyn DatabaseService> = match config.storage_backend {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| ApiError::Internal("DATABASE_URL is required".to_string()))?;
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory store; all data is lost on restart");
            Arc::new(InMemoryDatabase::new())
        }
    };

    // --- 3. Initialize Service Adapters ---
    let mailer: Arc<dyn NotificationService> = match &config.smtp {
        Some(smtp) => {
            let mailer = SmtpMailer::new(smtp)
                .map_err(|e| ApiError::Internal(format!("Invalid SMTP settings: {e}")))?;
            info!(host = %smtp.host, "Sending mail over SMTP");
            Arc::new(mailer)
        }
        None => {
            info!("SMTP_HOST not set; outgoing mail will only be logged");
            Arc::new(LogMailer)
        }
    };
    let payments = Arc::new(
        QrPaymentAdapter::new(&config.qr_base_url)
            .map_err(|e| ApiError::Internal(format!("Invalid QR_BASE_URL: {e}")))?,
    );

    // --- 4. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState::new(db, config.clone(), mailer, payments));
    let app = build_router(app_state)?;

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
