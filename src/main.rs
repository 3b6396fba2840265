use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use tokio::signal;
use tracing::{info, Level};

use tollgate::config::TollgateConfig;
use tollgate::http::RateLimitLayer;
use tollgate::ratelimit::{EndpointLimiter, RateLimiter};

/// How often idle rate-limit state is swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Reference server wiring the limiter stack into an axum application.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to a YAML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Clone)]
struct AppState {
    advice_limiter: Arc<EndpointLimiter>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    info!("Starting Tollgate");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match args.config.as_deref() {
        Some(path) => TollgateConfig::from_file(path)?,
        None => TollgateConfig::default(),
    };
    info!(listen_addr = %config.server.listen_addr, "Configuration loaded");

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limiting.requests_per_minute,
        config.rate_limiting.requests_per_hour,
    ));
    let advice_limiter = Arc::new(EndpointLimiter::new(config.endpoints.ai_requests_per_minute));
    info!(
        requests_per_minute = config.rate_limiting.requests_per_minute,
        requests_per_hour = config.rate_limiting.requests_per_hour,
        enabled = config.rate_limiting.enabled,
        "Rate limiter initialized"
    );

    // Periodically drop state for clients that have gone quiet.
    {
        let limiter = limiter.clone();
        let advice_limiter = advice_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = limiter.sweep_idle() + advice_limiter.sweep_idle();
                if removed > 0 {
                    info!(removed, "Swept idle rate-limit state");
                }
            }
        });
    }

    let state = AppState { advice_limiter };
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/advice", get(advice))
        .layer(RateLimitLayer::new(
            limiter,
            config.rate_limiting.enabled,
            config.rate_limiting.bypass_paths.clone(),
        ))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.server.listen_addr).await?;
    info!("Listening on {}", config.server.listen_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Tollgate stopped");
    Ok(())
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "app": "tollgate",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Sample endpoint guarded by the per-user limiter.
///
/// Over the limit it degrades to a canned reply instead of failing the
/// request; this is the intended consumption pattern for expensive
/// (e.g. model-backed) endpoints.
async fn advice(State(state): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    let user = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous");

    let advice = if state.advice_limiter.try_acquire(user) {
        "Log today's meals to keep your streak going."
    } else {
        "Take a short break and check back in a minute."
    };

    Json(serde_json::json!({ "advice": advice }))
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
