//! HTTP API gateway for ThinkFirst.
//!
//! Serves the tutoring API to the web client. The gateway holds no
//! session state: every request carries its own history and context,
//! and the response carries the new context back.
//!
//! Built on Axum.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::{
    Router,
    middleware::{self, Next},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use thinkfirst_runner::CodeRunner;
use thinkfirst_tutor::Tutor;

/// Maximum accepted request body.
const BODY_LIMIT: usize = 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub tutor: Arc<Tutor>,
    /// `None` answers `/api/execute` with 403.
    pub runner: Option<Arc<CodeRunner>>,
    pub api_key_configured: bool,
}

impl GatewayState {
    pub fn new(tutor: Arc<Tutor>) -> Self {
        Self {
            tutor,
            runner: None,
            api_key_configured: true,
        }
    }

    pub fn with_runner(mut self, runner: CodeRunner) -> Self {
        self.runner = Some(Arc::new(runner));
        self
    }

    pub fn with_api_key_configured(mut self, configured: bool) -> Self {
        self.api_key_configured = configured;
        self
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all routes and layers.
///
/// Layers, innermost first:
/// - Request body size limit (1 MB)
/// - CORS for `allowed_origins` (`"*"` allows any origin)
/// - Preflight responses rewritten to 204 No Content
/// - HTTP trace logging
pub fn build_router(state: SharedState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(api::root_handler))
        .route("/health", get(api::health_handler))
        .route("/api/chat", post(api::chat_handler))
        .route("/api/checkMemory", post(api::check_memory_handler))
        .route("/api/execute", post(api::execute_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors_layer(allowed_origins))
        .layer(middleware::from_fn(preflight_no_content))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Answer CORS preflights with 204 instead of 200.
async fn preflight_no_content(
    req: axum::extract::Request,
    next: Next,
) -> axum::response::Response {
    let is_preflight = req.method() == Method::OPTIONS;
    let mut response = next.run(req).await;
    if is_preflight && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

/// Build the tutor from configuration.
pub fn build_tutor(
    config: &thinkfirst_config::AppConfig,
) -> Result<Tutor, Box<dyn std::error::Error>> {
    let router = thinkfirst_providers::build_from_config(config);
    let provider = router
        .default()
        .ok_or("No default provider configured, set an API key")?;
    let model = thinkfirst_providers::default_model(config);
    let hub = thinkfirst_realtime::default_hub(&config.realtime);

    Ok(Tutor::new(provider, model)
        .with_config(config)
        .with_realtime(hub))
}

/// Start the gateway HTTP server.
pub async fn start(config: thinkfirst_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    if !config.has_api_key() {
        warn!("No API key configured, chat requests will fail until one is set");
    }

    let tutor = Arc::new(build_tutor(&config)?);
    info!(
        provider = tutor.provider_name(),
        model = tutor.model(),
        realtime = ?tutor.realtime().names(),
        "Tutor ready"
    );

    let mut state = GatewayState::new(tutor).with_api_key_configured(config.has_api_key());
    if config.runner.enabled {
        let runner = CodeRunner::new(&config.runner);
        warn!(
            languages = ?runner.languages(),
            timeout_secs = config.runner.timeout_secs,
            "Code execution enabled, snippets run unsandboxed as this user"
        );
        state = state.with_runner(runner);
    }
    let state = Arc::new(state);
    let app = build_router(state, &config.gateway.allowed_origins);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
