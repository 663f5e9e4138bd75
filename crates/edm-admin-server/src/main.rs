//! EDM Admin Server - Standalone administration API
//!
//! Serves the company, area and member administration API over in-memory
//! stores, optionally seeded from a JSON file. Callers are identified by the
//! `x-user-email` header set by the authenticating proxy in front.

mod config;
mod seed;
mod state;

use anyhow::Result;
use axum::{extract::State, http::HeaderValue, response::Json, routing::get, Router};
use clap::Parser;
use edm_admin::store::CompanyStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::state::AppState;

/// Command-line overrides; anything left unset comes from the environment
#[derive(Debug, Parser)]
#[command(name = "edm-admin-server", version, about = "EDM administration API server")]
struct Args {
    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long, short)]
    port: Option<u16>,

    /// JSON seed file loaded into the in-memory stores
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(seed) = self.seed {
            config.seed_file = Some(seed);
        }
        if self.json_logs {
            config.json_logs = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    args.apply(&mut config);
    config.validate()?;

    init_tracing(config.json_logs);
    info!("Starting EDM Admin Server on {}:{}", config.host, config.port);

    let (state, seeded) = AppState::initialize(config.clone()).await?;
    match seeded {
        Some(summary) => info!(companies = summary.companies, users = summary.users, "Stores seeded"),
        None => warn!("No seed file configured; starting with empty stores"),
    }

    let app = build_router(state);

    let addr = SocketAddr::new(config.host.parse()?, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "edm_admin=info,edm_admin_server=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .into_iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    // Public routes (no caller identity required)
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .with_state(state.clone());

    Router::new()
        .merge(public_routes)
        .merge(edm_admin::router(state.admin))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn root() -> &'static str {
    "EDM Admin Server"
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let companies = state.backend.companies.list().await.map(|c| c.len()).unwrap_or(0);
    Json(serde_json::json!({
        "status": "healthy",
        "library": state.config.admin.library_name,
        "companies": companies,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn app(config: Config) -> Router {
        let (state, _) = AppState::initialize(config).await.unwrap();
        build_router(state)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = app(Config::default())
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["companies"], 0);
    }

    #[tokio::test]
    async fn test_api_requires_caller_header() {
        let response = app(Config::default())
            .await
            .oneshot(Request::get("/api/companies").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let config = Config {
            cors_allowed_origins: Some("https://edm.example.com".to_string()),
            ..Config::default()
        };
        let response = app(config)
            .await
            .oneshot(
                Request::get("/health")
                    .header("origin", "https://edm.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://edm.example.com"
        );
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from(["edm-admin-server", "--port", "9000", "--seed", "seed.json"]);
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.port, 9000);
        assert_eq!(config.seed_file, Some(PathBuf::from("seed.json")));
        assert_eq!(config.host, "0.0.0.0");
    }
}
