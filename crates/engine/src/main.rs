use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, routing::post, Json, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use reflectgate_engine::analytics::{self, ChannelSink};
use reflectgate_engine::config;
use reflectgate_engine::controller::{GateSettings, Providers, ReflectionGate};

mod routes;

/// Shared application state accessible from axum handlers.
pub struct AppState {
    pub gate: ReflectionGate,
    pub metrics_handle: PrometheusHandle,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Reflection gate starting");

    // Load configuration; fail loudly on misconfiguration.
    let config_dir = std::env::var("REFLECTGATE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let engine_config = match config::load_config(&config_dir) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration, refusing to start");
            std::process::exit(1);
        }
    };

    // Install Prometheus metrics recorder.
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    let settings = match GateSettings::from_config(&engine_config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Invalid gate settings, refusing to start");
            std::process::exit(1);
        }
    };

    // Providers are optional. Missing API keys fall back to local paths.
    let providers = match Providers::from_config(&engine_config) {
        Ok(providers) => providers,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build providers, refusing to start");
            std::process::exit(1);
        }
    };

    let (sink, events) = ChannelSink::new(engine_config.system.analytics.channel_capacity);
    let _drain_handle = analytics::spawn_drain(events);

    let gate = ReflectionGate::new(settings, providers, Arc::new(sink));
    let status = gate.provider_status();
    tracing::info!(
        evaluator = status.evaluator.unwrap_or("heuristic"),
        language_model = status.language_model,
        "Providers configured"
    );

    let state = Arc::new(AppState {
        gate,
        metrics_handle,
    });

    // Build HTTP server.
    let app = Router::new()
        .route("/reflect", post(routes::reflect_handler))
        .route("/ask", post(routes::ask_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    let port: u16 = std::env::var("REFLECTGATE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind TCP listener");

    tracing::info!(port = port, "Reflection gate listening");

    axum::serve(listener, app).await.expect("HTTP server error");
}

/// Health check endpoint. The gate always answers; degraded providers are
/// reported but don't make it unhealthy.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.gate.provider_status();

    let degraded = status.evaluator.is_none() || !status.language_model;

    Json(serde_json::json!({
        "status": if degraded { "degraded" } else { "healthy" },
        "providers": {
            "evaluator": status.evaluator.unwrap_or("heuristic"),
            "language_model": if status.language_model { "available" } else { "fallback_bank" },
        }
    }))
}

/// Prometheus metrics endpoint.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
