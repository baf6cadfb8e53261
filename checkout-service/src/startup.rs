//! Application startup and lifecycle management.

use crate::config::Config;
use crate::handlers;
use crate::services::{init_metrics, MercadoPagoClient, PaymentProvider};
use axum::{
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state. Everything in it is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub provider: Arc<dyn PaymentProvider>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the Mercado Pago client.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let client = MercadoPagoClient::new(config.mercado_pago.clone()).map_err(|e| {
            tracing::error!("Failed to create Mercado Pago client: {}", e);
            AppError::ConfigError(e.into())
        })?;

        if client.is_configured() {
            tracing::info!("Mercado Pago client initialized");
        } else {
            tracing::warn!(
                "MP_ACCESS_TOKEN not configured - preference creation will fail"
            );
        }

        Self::build_with_provider(config, Arc::new(client)).await
    }

    /// Build the application around an arbitrary payment provider.
    pub async fn build_with_provider(
        config: Config,
        provider: Arc<dyn PaymentProvider>,
    ) -> Result<Self, AppError> {
        init_metrics();

        if let Some(platform) = &config.deployment_platform {
            tracing::info!(platform = %platform, "Running on deployment platform");
        }

        let port = config.server.port;
        let state = AppState {
            config: Arc::new(config),
            provider,
        };
        let router = build_router(state);

        // Port 0 binds a random port (tests)
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Checkout service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }
}

/// Every route is served both at the root and under `/api`, where the
/// deployed front-end reaches it.
pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route(
            "/create-preference",
            post(handlers::preference::create_preference),
        )
        .route("/webhook", post(handlers::webhook::webhook));

    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

/// No configured origins means any origin may call the API.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(AnyOrigin)
    } else {
        AllowOrigin::list(allowed_origins.iter().filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}", origin, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

/// Panics inside a handler become a generic 500 with no details.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    AppError::InternalError(anyhow::anyhow!("handler panicked: {}", message)).into_response()
}
