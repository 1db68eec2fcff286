//! Test server harness for E2E testing
//!
//! Provides `TestSessionServer` for spawning real session service instances
//! in tests, backed by an in-memory store or any injected store double.

use crate::test_ids::{TEST_ACCESS_SECRET, TEST_REFRESH_SECRET};
use common::jwt::DEFAULT_CLOCK_SKEW;
use common::secret::SecretString;
use common::types::SubjectId;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use session_service::observability::metrics::init_metrics_recorder;
use session_service::routes::{self, AppState};
use session_service::services::{SessionManager, SessionPolicy, TokenPair};
use session_service::store::{CredentialStore, InMemoryCredentialStore};
use session_service::token::TokenCodec;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics handle shared by every test server in the process.
///
/// The global recorder can only be installed once; later servers reuse it,
/// and a standalone recorder is used if something else already installed one.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Token codec with the fixed test secrets.
pub fn test_codec() -> TokenCodec {
    TokenCodec::new(
        SecretString::from(TEST_ACCESS_SECRET),
        SecretString::from(TEST_REFRESH_SECRET),
        DEFAULT_CLOCK_SKEW,
    )
    .expect("test secrets are non-empty")
}

/// Session Manager over `store` with the fixed test secrets.
pub fn test_manager(store: Arc<dyn CredentialStore>, policy: SessionPolicy) -> SessionManager {
    SessionManager::new(store, test_codec(), policy)
}

/// Test harness for spawning the session service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_refresh_e2e() -> Result<()> {
///     let server = TestSessionServer::spawn().await?;
///     let pair = server.issue("user-42").await?;
///
///     let response = reqwest::Client::new()
///         .post(format!("{}/api/v1/auth/refresh", server.url()))
///         .json(&serde_json::json!({ "refresh_token": pair.refresh_token }))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestSessionServer {
    addr: SocketAddr,
    manager: SessionManager,
    _handle: JoinHandle<()>,
}

impl TestSessionServer {
    /// Spawn a server backed by a fresh in-memory store and default policy.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_store(Arc::new(InMemoryCredentialStore::new())).await
    }

    /// Spawn a server backed by `store` (e.g. a failure-injecting double).
    pub async fn spawn_with_store(store: Arc<dyn CredentialStore>) -> Result<Self, anyhow::Error> {
        Self::spawn_with_manager(test_manager(store, SessionPolicy::default())).await
    }

    /// Spawn a server around a pre-built Session Manager.
    pub async fn spawn_with_manager(manager: SessionManager) -> Result<Self, anyhow::Error> {
        let state = Arc::new(AppState {
            manager: manager.clone(),
        });

        let app = routes::build_routes(state, test_metrics_handle());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            manager,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The server's Session Manager, for issuing and inspecting credentials
    /// directly.
    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    /// Issue a token pair the way an upstream login resolver would.
    pub async fn issue(&self, subject: &str) -> Result<TokenPair, anyhow::Error> {
        Ok(self.manager.issue(&SubjectId::from(subject)).await?)
    }
}

impl Drop for TestSessionServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
