//! Timetable Scheduling - Axum Server
//!
//! Run with: cargo run
//! Then open: http://localhost:7860/health

use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use timetable_scheduling::api;
use timetable_scheduling::config::ServerConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("timetable_scheduling=info".parse().unwrap()))
        .init();

    let config = ServerConfig::from_env().expect("invalid configuration");
    let addr = config.socket_addr().expect("invalid bind address");

    #[cfg(feature = "console")]
    {
        timetable_scheduling::console::print_banner();
        timetable_scheduling::console::print_config(&config);
    }

    let state = Arc::new(api::AppState::new(config.policy));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!(%addr, room_scope = ?config.policy.room_scope, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
