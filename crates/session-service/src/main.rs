use session_service::config::{Config, StoreBackend};
use session_service::observability::metrics::init_metrics_recorder;
use session_service::routes::{self, AppState};
use session_service::services::SessionManager;
use session_service::store::{CredentialStore, InMemoryCredentialStore, RedisCredentialStore};
use session_service::token::TokenCodec;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Session Service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        store_backend = ?config.store_backend,
        access_token_ttl_seconds = config.access_token_ttl_seconds,
        refresh_token_ttl_seconds = config.refresh_token_ttl_seconds,
        jwt_clock_skew_seconds = config.jwt_clock_skew_seconds,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        e
    })?;

    // Connect the credential store
    let store: Arc<dyn CredentialStore> = match config.store_backend {
        StoreBackend::Redis => {
            info!(address = %config.redis.address, "Connecting to credential store...");
            let store = RedisCredentialStore::connect(&config.redis)
                .await
                .map_err(|e| {
                    error!("Failed to connect to credential store: {}", e);
                    e
                })?;
            info!("Credential store connection established");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory credential store; sessions are lost on restart and not shared between instances");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let codec = TokenCodec::new(
        config.access_secret.clone(),
        config.refresh_secret.clone(),
        config.jwt_clock_skew(),
    )
    .map_err(|e| {
        error!("Failed to initialize token codec: {}", e);
        e
    })?;

    let manager = SessionManager::new(store, codec, config.session_policy());
    let state = Arc::new(AppState { manager });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Session Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Session Service shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
