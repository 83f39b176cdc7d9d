//! FBO Fuel Core - API Server Binary
//!
//! Starts the HTTP API server for the receipt and fee-schedule core.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin fbo-api
//!
//! # Run with environment variables
//! API_HOST=0.0.0.0 API_PORT=8080 DATABASE_URL=postgres://... cargo run --bin fbo-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_DATABASE_URL` / `DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_TAX_RATE_PERCENT` - Sales tax rate applied to receipts (default: 8.0)

use std::net::SocketAddr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::Rate;
use domain_pricing::{FeeCalculationConfig, FeeCalculationEngine};
use domain_receipts::ReceiptLifecycleService;
use domain_schedule::ScheduleConfigService;
use infra_db::{
    create_pool_from_url, run_migrations, PostgresAuditSink, PostgresCustomerRepository,
    PostgresFuelOrderRepository, PostgresFuelPriceSource, PostgresPricingCatalogSource,
    PostgresReceiptRepository, PostgresScheduleStore, PostgresVersionRepository,
};
use interface_api::{config::ApiConfig, create_router, AppState};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, establishes the database
/// connection, wires the domain services over their PostgreSQL adapters,
/// and serves until shutdown.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = load_config();

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting FBO Fuel Core API Server"
    );

    let pool = create_pool_from_url(&config.database_url).await?;
    run_migrations(&pool).await?;

    let state = build_state(pool, config.clone());
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads API configuration from environment variables, falling back to
/// individual variables and defaults when the prefixed form is absent
fn load_config() -> ApiConfig {
    ApiConfig::from_env().unwrap_or_else(|_| {
        let defaults = ApiConfig::default();
        ApiConfig {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("API_DATABASE_URL"))
                .unwrap_or(defaults.database_url),
            log_level: std::env::var("API_LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            tax_rate_percent: std::env::var("API_TAX_RATE_PERCENT")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.tax_rate_percent),
            fbo_location_id: std::env::var("API_FBO_LOCATION_ID")
                .ok()
                .and_then(|id| id.parse().ok()),
        }
    })
}

/// Initializes the tracing subscriber for structured logging
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Wires the domain services over their PostgreSQL adapters
fn build_state(pool: infra_db::DatabasePool, config: ApiConfig) -> AppState {
    let tax_rate = Decimal::try_from(config.tax_rate_percent)
        .map(Rate::from_percentage)
        .unwrap_or_else(|_| FeeCalculationConfig::default().tax_rate);
    let engine = FeeCalculationEngine::new(FeeCalculationConfig { tax_rate });

    let receipts = Arc::new(ReceiptLifecycleService::new(
        Arc::new(PostgresReceiptRepository::new(pool.clone())),
        Arc::new(PostgresFuelOrderRepository::new(pool.clone())),
        Arc::new(PostgresCustomerRepository::new(pool.clone())),
        Arc::new(PostgresFuelPriceSource::new(pool.clone())),
        Arc::new(PostgresPricingCatalogSource::new(pool.clone())),
        Arc::new(PostgresAuditSink::new(pool.clone())),
        engine,
    ));

    let schedule = Arc::new(ScheduleConfigService::new(
        Arc::new(PostgresScheduleStore::new(pool.clone())),
        Arc::new(PostgresVersionRepository::new(pool)),
    ));

    AppState::new(receipts, schedule, config)
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), enabling graceful
/// shutdown so in-flight requests complete before the process exits
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
