//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! [`start_server`] installs the tracing subscriber, loads and validates
//! [`Config`], connects the EVM client, and serves the router built by
//! [`create_router`].

// region: --- Imports
use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use lib_core::Config;
use lib_evm::EvmState;
use lib_utils::get_env_opt;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers;
use crate::middleware::{log_requests, stamp_req, RequestStamp};
use crate::services::SwapService;
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub swap: SwapService,
}

impl AppState {
    pub fn new(evm: EvmState) -> Self {
        Self {
            swap: SwapService::new(Arc::new(evm)),
        }
    }
}

impl FromRef<AppState> for SwapService {
    fn from_ref(state: &AppState) -> Self {
        state.swap.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3001")
    pub bind_address: String,
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Install the global tracing subscriber, filtered by `LOG_LEVEL` (default `info`).
///
/// `LOG_LEVEL` accepts a plain level or a full `EnvFilter` directive such as
/// `info,lib_evm=debug`. Call after `.env` is loaded.
pub fn init_tracing() -> anyhow::Result<()> {
    let (log_level, filter) = log_filter(get_env_opt("LOG_LEVEL"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global tracing subscriber: {}", e))?;

    info!(" Log level: {}", log_level);
    Ok(())
}

/// Directive to apply and its filter; unset or unparsable levels fall back to `info`.
fn log_filter(log_level: Option<String>) -> (String, tracing_subscriber::EnvFilter) {
    let log_level = log_level.unwrap_or_else(|| "info".to_string()).to_lowercase();
    match tracing_subscriber::EnvFilter::try_new(&log_level) {
        Ok(filter) => (log_level, filter),
        Err(_) => ("info".to_string(), tracing_subscriber::EnvFilter::new("info")),
    }
}

/// Initialize and start the HTTP server
///
/// # Errors
///
/// This function will return an error if:
/// - The tracing subscriber cannot be installed
/// - Configuration loading or validation fails
/// - The EVM client cannot be built (bad key or RPC URL)
/// - Server binding fails
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;
    info!(" DEFI SWAP BACKEND STARTING");

    info!("Loading configuration...");
    let app_config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    app_config.validate().map_err(|e| anyhow::anyhow!(e))?;
    info!(
        rpc_url = %app_config.rpc_url,
        fee_tier = app_config.swap.fee_tier,
        slippage_bps = app_config.swap.slippage_bps,
        "Configuration loaded"
    );

    info!(" Connecting EVM client...");
    let evm = EvmState::new(&app_config)?;
    info!(signer = %evm.gateway.signer_address(), " EVM client ready");

    let state = AppState::new(evm);
    let app = create_router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    info!(" SERVER READY: http://{}", config.bind_address);
    log_server_info();

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::HeaderName::from_static("x-request-id")]);

    Router::new()
        .route("/api/defi/swap", post(handlers::swap::execute_swap))
        .route("/health", get(|| async { "OK" }))
        .fallback(|| async {
            info!("[404 HANDLER] Unmatched route - returning 404");
            (StatusCode::NOT_FOUND, "Route not found")
        })
        .with_state(state)
        // Innermost first: logging must run inside stamping to see the request ID
        .layer(axum::middleware::from_fn(log_requests))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                },
            ),
        )
        .layer(axum::middleware::from_fn(stamp_req))
        .layer(cors)
}

/// Log server information
fn log_server_info() {
    info!(" SWAP:");
    info!("   • POST /api/defi/swap  {{tokenIn, tokenOut, swapAmount}}");
    info!(" HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use lib_core::config::DEFAULT_EXPLORER_TX_URL;
    use lib_evm::testing::{fixtures, FakeLedger};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = Config {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            private_key: "0x01".to_string(),
            contracts: fixtures::contracts(),
            swap: fixtures::settings(),
            confirmation_timeout: None,
            explorer_tx_url: DEFAULT_EXPLORER_TX_URL.to_string(),
        };
        let evm = EvmState::with_gateway(
            Arc::new(FakeLedger::new()),
            config.contracts,
            config.swap,
            config.explorer_tx_url,
        );
        AppState::new(evm)
    }

    #[test]
    fn test_log_filter_levels() {
        assert_eq!(log_filter(None).0, "info");
        assert_eq!(log_filter(Some("DEBUG".to_string())).0, "debug");
        assert_eq!(log_filter(Some("info,lib_evm=trace".to_string())).0, "info,lib_evm=trace");
        assert_eq!(log_filter(Some("lib_evm=verbose".to_string())).0, "info");
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(test_state(), &ServerConfig::default().allowed_origins);

        let res = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = create_router(test_state(), &[]);

        let res = app
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_swap_route_is_wired() {
        let app = create_router(test_state(), &[]);

        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/defi/swap")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        // missing fields are a validation error, not a 404
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
