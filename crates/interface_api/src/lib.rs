//! HTTP API Layer
//!
//! REST surface for the receipt lifecycle and fee schedule
//! administration, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: request handlers delegating to the domain services
//! - **DTOs**: request/response types with boundary validation; enum
//!   fields travel as their wire strings
//! - **Error handling**: domain errors mapped to consistent JSON error
//!   responses
//!
//! Authentication and permission checks are provided by the surrounding
//! deployment (gateway middleware); this crate carries tracing and CORS
//! layers only.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use state::AppState;

use crate::handlers::{health, receipts, schedule};

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Receipt lifecycle routes
    let receipt_routes = Router::new()
        .route("/", get(receipts::list_receipts))
        .route("/draft", post(receipts::create_draft))
        .route("/:id", get(receipts::get_receipt))
        .route("/:id/draft", put(receipts::update_draft))
        .route("/:id/calculate-fees", post(receipts::calculate_fees))
        .route("/:id/generate", post(receipts::generate))
        .route("/:id/mark-paid", post(receipts::mark_paid))
        .route("/:id/void", post(receipts::void))
        .route(
            "/:id/line-items/:line_item_id/toggle-waiver",
            post(receipts::toggle_waiver),
        );

    // Fee schedule administration routes
    let schedule_routes = Router::new()
        .route("/versions", post(schedule::create_version))
        .route("/versions", get(schedule::list_versions))
        .route("/versions/:id/restore", post(schedule::restore_version));

    let api_routes = Router::new()
        .nest("/receipts", receipt_routes)
        .nest("/fee-schedule", schedule_routes);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
