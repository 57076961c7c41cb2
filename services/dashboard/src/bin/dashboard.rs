//! services/dashboard/src/bin/dashboard.rs

use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use dashboard_core::{auth::AuthStore, ports::ProfileStore};
use dashboard_lib::{
    adapters::{DbProfileStore, GoTrueAdapter, PostgrestProfileStore},
    config::{Config, ConfigError},
    error::ApiError,
    web::{router, state::AppState, ApiDoc},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting dashboard...");

    // --- 2. Initialize Service Adapters ---
    let http = reqwest::Client::builder()
        .user_agent(concat!("dashboard/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let session_client = Arc::new(GoTrueAdapter::new(
        http.clone(),
        &config.supabase_url,
        config.supabase_anon_key.clone(),
    ));
    let refresher = session_client.start_auto_refresh();

    let profiles: Arc<dyn ProfileStore> = match &config.database_url {
        Some(database_url) => {
            info!(table = %config.profile_table, "Connecting to database for profile storage...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let store = DbProfileStore::new(db_pool, &config.profile_table);
            info!("Running database migrations...");
            store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(store)
        }
        None => {
            info!(table = %config.profile_table, "Using REST gateway for profile storage");
            Arc::new(PostgrestProfileStore::new(
                http,
                &config.supabase_url,
                config.supabase_anon_key.clone(),
                &config.profile_table,
            ))
        }
    };

    // --- 3. Build the Auth Store & Restore Any Session ---
    let auth = Arc::new(AuthStore::new(session_client, profiles));
    auth.attach().await;
    let app_state = Arc::new(AppState::new(auth.clone()));

    // --- 4. Create the Web Router ---
    let mut app = router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = &config.cors_origin {
        let origin = origin.parse::<HeaderValue>().map_err(|e| {
            ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
        })?;
        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, ACCEPT]);
        app = app.layer(cors);
    }

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- 6. Tear Down ---
    auth.detach();
    refresher.cancel();
    info!("Dashboard stopped.");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
