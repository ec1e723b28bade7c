//! clipstream API Server
//!
//! Binds the router to the configured address after wiring the Postgres-backed
//! user directory, token manager, and CORS/trace layers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipstream_api::{
    directory::PgUserDirectory, routes::create_router, AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,clipstream_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting clipstream API server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    tracing::info!("Connecting to database...");
    let pool = clipstream_shared::create_pool(&config.database_url).await?;
    clipstream_shared::run_migrations(&pool).await?;
    tracing::info!("Database connection established");

    let directory = Arc::new(PgUserDirectory::new(pool));
    let state = AppState::new(directory, config.clone());

    // Restrict CORS to an explicit allowlist; credentials must be enabled for
    // the cookie-based session flow.
    let allowed_origins: Vec<axum::http::HeaderValue> = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    tracing::info!(
        allowed_origins = ?allowed_origins,
        "CORS configured with {} allowed origins",
        allowed_origins.len()
    );

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
        ])
        .expose_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
