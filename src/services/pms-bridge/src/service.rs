//! Service startup for the PMS Bridge Service
//!
//! Builds the shared application state (translator registry, tenant store, RGBridge
//! sender, feed pipeline), wires the middleware stack and serves until a shutdown
//! signal arrives.

use crate::config::BridgeConfig;
use crate::delivery::RgbridgeSender;
use crate::error::{BridgeError, BridgeResult};
use crate::handlers::create_routes;
use crate::pipeline::FeedProcessor;
use crate::tenant::FsTenantStore;
use crate::translator::TranslatorRegistry;
use axum::extract::DefaultBodyLimit;
use axum::serve;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Main PMS bridge service
pub struct BridgeService {
    app_state: Arc<AppState>,
    addr: SocketAddr,
}

/// Application state shared across handlers
pub struct AppState {
    /// Service configuration
    pub config: BridgeConfig,
    /// Tenant directories under `storage.pms_root`
    pub store: Arc<FsTenantStore>,
    /// Feed pipeline, owning the translator registry and stats tracker
    pub processor: FeedProcessor,
    /// Process start, for health reporting
    pub started_at: Instant,
}

impl AppState {
    /// Assemble state from explicit parts
    pub fn new(
        config: BridgeConfig,
        registry: TranslatorRegistry,
        store: Arc<FsTenantStore>,
        sender: RgbridgeSender,
    ) -> Self {
        let processor = FeedProcessor::new(Arc::new(registry), store.clone(), Arc::new(sender));
        Self {
            config,
            store,
            processor,
            started_at: Instant::now(),
        }
    }

    /// State with the built-in translators, filesystem store and HTTP delivery
    pub fn from_config(config: BridgeConfig) -> BridgeResult<Self> {
        let registry = TranslatorRegistry::builtin();
        if registry.is_empty() {
            warn!("No PMS translator plugins registered; all tenants use mappings");
        } else {
            info!(plugins = ?registry.codes(), "Translator registry ready");
        }

        let store = Arc::new(FsTenantStore::new(config.storage.pms_root.clone()));
        let sender = RgbridgeSender::from_config(&config.rgbridge)?;

        Ok(Self::new(config, registry, store, sender))
    }
}

/// Request ID generator
#[derive(Clone, Default)]
struct BridgeMakeRequestId;

impl MakeRequestId for BridgeMakeRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = format!("req-{}", Uuid::new_v4());
        axum::http::HeaderValue::from_str(&id)
            .ok()
            .map(RequestId::new)
    }
}

impl BridgeService {
    /// Validate configuration and build the service
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        info!("Initializing PMS Bridge Service");

        config.validate().map_err(BridgeError::configuration)?;

        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| BridgeError::configuration(format!("Invalid server address: {}", e)))?;

        let app_state = Arc::new(AppState::from_config(config)?);

        Ok(Self { app_state, addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> Arc<AppState> {
        self.app_state.clone()
    }

    /// Router with the full middleware stack applied
    pub fn router(state: Arc<AppState>) -> axum::Router {
        let server = &state.config.server;
        let header = axum::http::header::HeaderName::from_static(REQUEST_ID_HEADER);

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(header.clone(), BridgeMakeRequestId))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(header))
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout)));

        let mut app = create_routes(state.clone())
            .layer(DefaultBodyLimit::max(server.max_body_size))
            .layer(middleware);

        if server.cors_enabled {
            app = app.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        app
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn start(self) -> BridgeResult<()> {
        info!(
            addr = %self.addr,
            pms_root = %self.app_state.config.storage.pms_root.display(),
            endpoint = %self.app_state.config.rgbridge.endpoint,
            "Starting PMS Bridge Service"
        );

        let app = Self::router(self.app_state.clone());

        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| BridgeError::internal(format!("Failed to bind to address: {}", e)))?;

        info!("PMS bridge service listening on {}", self.addr);

        if let Err(e) = serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(Self::shutdown_signal())
        .await
        {
            error!("Server error: {}", e);
            return Err(BridgeError::internal(format!("Server error: {}", e)));
        }

        info!("PMS bridge service stopped gracefully");
        Ok(())
    }

    /// Wait for shutdown signal
    async fn shutdown_signal() {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C, shutting down");
            }
            _ = terminate => {
                info!("Received terminate signal, shutting down");
            }
        }
    }
}
