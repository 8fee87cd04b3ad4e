use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use slotbook::config::AppConfig;
use slotbook::db;
use slotbook::handlers;
use slotbook::services::sweeper;
use slotbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let state = Arc::new(AppState::new(conn, config.clone()));

    sweeper::spawn(state.store.clone(), config.sweep_interval_secs);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/resources", get(handlers::booking::list_resources))
        .route("/api/availability", get(handlers::booking::get_availability))
        .route(
            "/api/bookings",
            get(handlers::booking::my_bookings).post(handlers::booking::create_booking),
        )
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::booking::cancel_booking),
        )
        .route("/api/admin/resources", post(handlers::admin::create_resource))
        .route(
            "/api/admin/resources/:id/slots",
            post(handlers::admin::create_slot),
        )
        .route(
            "/api/admin/resources/:id/deactivate",
            post(handlers::admin::deactivate_resource),
        )
        .route("/api/admin/bookings", get(handlers::admin::get_reservations))
        .route("/api/admin/status", get(handlers::admin::get_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
