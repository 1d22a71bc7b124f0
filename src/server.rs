use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::database::DeviceStore;
use crate::handlers::{self, devices};
use crate::middleware::{error_envelope, request_logger};
use crate::shutdown::shutdown_signal;

/// How long in-flight TLS connections get to finish after a shutdown signal.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared by every handler. Holds no mutable state of its own.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DeviceStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DeviceStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/health", get(handlers::health).fallback(handlers::method_not_allowed))
        .nest("/api/v1", device_routes())
        .fallback(handlers::not_found)
        .layer(from_fn_with_state(state.clone(), error_envelope));

    if state.config.logging.enabled {
        router = router.layer(from_fn_with_state(state.config.logging, request_logger));
    }

    router
        // Global middleware
        .layer(state.config.server.cors.layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn device_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(devices::list).post(devices::set_status).fallback(handlers::method_not_allowed))
        .route("/heartbeat", post(devices::heartbeat).fallback(handlers::method_not_allowed))
        .route("/battery", post(devices::set_battery).fallback(handlers::method_not_allowed))
        .route("/message", post(devices::set_message).fallback(handlers::method_not_allowed))
}

/// Serve until SIGINT/SIGTERM, over TLS when configured.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let config = state.config.clone();
    let bind_address = config.server.bind_address();
    let addr = resolve(&bind_address).await?;
    let app = app(state);

    if config.server.ssl.enabled {
        let ssl = &config.server.ssl;
        let tls = RustlsConfig::from_pem_file(&ssl.cert_file, &ssl.key_file)
            .await
            .with_context(|| {
                format!(
                    "failed to load TLS key {} / certificate {}",
                    ssl.key_file.display(),
                    ssl.cert_file.display()
                )
            })?;

        let handle = axum_server::Handle::new();
        let shutdown = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        info!("watchme listening on https://{}", addr);
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .context("TLS server failed")?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        info!("watchme listening on http://{}", addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server failed")?;
    }

    Ok(())
}

async fn resolve(bind_address: &str) -> anyhow::Result<SocketAddr> {
    tokio::net::lookup_host(bind_address)
        .await
        .with_context(|| format!("failed to resolve {}", bind_address))?
        .next()
        .with_context(|| format!("{} resolved to no address", bind_address))
}
