use anyhow::Context;
use axum::{
    Router,
    extract::{Json, Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tracing::field::Empty;
use tracing::{Span, error, info, instrument};
use user_store::{DynamoUserStore, MemoryUserStore, UserStore};

pub mod config;
pub mod lookup;
pub mod metrics;
pub mod open_telemetry;

use config::{Config, RuntimeMode, StoreBackend};
use lookup::{USER_ID_PARAM, lookup_user};
use metrics::Metrics;

/// Store client shared by every invocation in the process
pub type SharedStore = Arc<dyn UserStore>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub metrics: Arc<Metrics>,
    pub mode: RuntimeMode,
}

// --- Store Connection ---

pub async fn connect_store(config: &Config) -> anyhow::Result<SharedStore> {
    match &config.backend {
        StoreBackend::DynamoDb => {
            info!(table = %config.table_name, "Connecting to DynamoDB");
            let store =
                DynamoUserStore::from_env(&config.table_name, config.dynamodb_endpoint.as_deref())
                    .await;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory { seed_file } => {
            let store = match seed_file {
                Some(path) => MemoryUserStore::from_json_file(&config.table_name, path)
                    .context("Failed to seed in-memory user store")?,
                None => MemoryUserStore::new(&config.table_name, Vec::new()),
            };
            info!(table = %config.table_name, items = store.len(), "Using in-memory user store");
            Ok(Arc::new(store))
        }
    }
}

// --- Router Setup ---

/// Any path other than the service routes is a user lookup
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .fallback(lookup_handler)
        .with_state(state)
}

// --- Server Lifecycle ---

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config().context("Failed to load configuration")?;

    let telemetry =
        open_telemetry::init_tracing(&config).context("Failed to initialize tracing")?;
    let (meter_provider, metrics) =
        metrics::init_metrics(&config).context("Failed to initialize metrics")?;

    info!(mode = config.mode.as_str(), "Starting user lookup service");

    let store = connect_store(&config).await?;

    let state = AppState {
        store,
        metrics: Arc::new(metrics),
        mode: config.mode.clone(),
    };

    let app = create_app(state);

    match config.mode {
        RuntimeMode::Lambda => {
            lambda_http::run(app)
                .await
                .map_err(|e| anyhow::anyhow!(e))
                .context("Lambda runtime error")?;
        }
        RuntimeMode::Server => {
            let listener = tokio::net::TcpListener::bind(&config.listen_addr)
                .await
                .context("Failed to bind port")?;

            info!(addr = %config.listen_addr, "Listening for requests");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Server error")?;
        }
    }

    if let Err(e) = meter_provider.shutdown() {
        error!(error = %e, "Failed to shutdown meter provider");
    }
    telemetry.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, starting graceful shutdown");
}

// --- Request Handlers ---

/// Lookup handler - resolves `user_id` against the store.
///
/// Always answers with a response; store, decode and encode failures become
/// status codes rather than errors surfaced to the runtime.
#[instrument(skip(state, params), fields(user_id = Empty, outcome = Empty))]
async fn lookup_handler(
    State(state): State<AppState>,
    params: Option<Query<HashMap<String, String>>>,
) -> Response {
    let start = Instant::now();
    let span = Span::current();

    // Unparseable query strings are treated like a missing parameter
    let user_id = params
        .and_then(|Query(mut params)| params.remove(USER_ID_PARAM))
        .unwrap_or_default();
    span.record("user_id", user_id.as_str());

    let result = lookup_user(state.store.as_ref(), &user_id).await;

    let outcome = match &result {
        Ok(_) => "found",
        Err(e) => e.outcome(),
    };
    span.record("outcome", outcome);

    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    state.metrics.record_lookup(outcome, duration_ms);

    match result {
        Ok(user) => user.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "table": state.store.table_name(),
    }))
}

/// Version handler
async fn version_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "mode": state.mode.as_str(),
    }))
}
