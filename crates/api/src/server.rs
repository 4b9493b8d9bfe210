// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server implementation module
//!
//! This module provides the main server struct and implementation for the prediction
//! server, including server lifecycle management, router configuration, and coordinated
//! graceful shutdown using `CancellationToken`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use age_model::InferenceService;
use axum::{Router, http::HeaderName};
use hyper::Request;
use shared_types::FeatureContract;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    routes::create_routes,
    state::ServerState,
};

// Server constants
const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS: u64 = 5;

/// Configuration for server shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time to wait for graceful shutdown before forcing termination
    pub graceful_timeout: Duration,
    /// Maximum time to wait for all tasks to complete after graceful shutdown
    pub force_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
            force_timeout: Duration::from_secs(DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    config: ServerConfig,
    /// Application router
    router: Router,
    /// Server state
    state: ServerState,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
    /// Configuration for coordinated shutdown
    graceful_shutdown_config: ShutdownConfig,
}

impl Server {
    /// Create new server instance serving the configured artifact
    ///
    /// The artifact is not read here; see [`Server::preload_model`].
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid.
    pub fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let inference = InferenceService::new(FeatureContract::abalone(), &config.artifact_path);
        Self::with_inference(config, shutdown_config, Arc::new(inference))
    }

    /// Create server with a custom inference service for dependency injection
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid.
    pub fn with_inference(
        config: ServerConfig,
        graceful_shutdown_config: ShutdownConfig,
        inference: Arc<InferenceService>,
    ) -> ServerResult<Self> {
        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(config.clone(), inference, cancellation_token.child_token());
        let router = Self::create_router(state.clone());

        Ok(Self {
            config,
            router,
            state,
            cancellation_token,
            graceful_shutdown_config,
        })
    }

    /// Create application router with middleware
    fn create_router(state: ServerState) -> Router {
        let timeout_duration = state.config().timeout_seconds.value();

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                    if let Some(request_id) = req.headers().get(REQUEST_ID_HEADER) {
                        info_span!("http_request", ?request_id, method = %req.method(), uri = %req.uri())
                    } else {
                        error!("failed to extract id from request");
                        info_span!("http_request", request_id = "unknown")
                    }
                }),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(CorsLayer::permissive())
            .layer(TimeoutLayer::new(timeout_duration));

        create_routes().layer(middleware).with_state(state)
    }

    /// Load the artifact before accepting traffic
    ///
    /// A failure is logged and the server keeps running: health and info stay
    /// available, predictions answer 503 until a reload succeeds.
    pub async fn preload_model(&self) {
        let inference = self.state.inference();
        match inference.ensure_loaded().await {
            Ok(_) => info!(
                path = %inference.artifact_path().display(),
                "model artifact loaded"
            ),
            Err(err) => warn!(
                error = %err,
                path = %inference.artifact_path().display(),
                "model artifact unavailable, serving without a model"
            ),
        }
    }

    /// Run the server with coordinated graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address,
    /// `ServerError::Startup` if the server fails to start, or
    /// `ServerError::Shutdown` if serving fails.
    pub async fn run(self) -> ServerResult<()> {
        let listener = self.bind().await?;
        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        self.preload_model().await;

        info!(
            address = %actual_addr,
            environment = %self.config.environment,
            artifact = %self.config.artifact_path.display(),
            "abalone age API server starting",
        );

        let cancellation_token = self.cancellation_token.clone();
        let shutdown_token = cancellation_token.clone();
        tokio::spawn(async move {
            info!("spawning the graceful shutdown task");
            Self::shutdown_signal_handler(shutdown_token).await;
        });

        let router = self.router;
        let serve_token = cancellation_token.clone();
        let mut server_task: JoinHandle<std::io::Result<()>> = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { serve_token.cancelled().await })
                .await
        });

        tokio::select! {
            result = &mut server_task => return Self::finish(result),
            () = cancellation_token.cancelled() => {}
        }

        let ShutdownConfig {
            graceful_timeout,
            force_timeout,
        } = self.graceful_shutdown_config;

        if let Ok(result) = tokio::time::timeout(graceful_timeout, &mut server_task).await {
            info!("abalone age API server shut down gracefully");
            return Self::finish(result);
        }

        warn!(
            timeout_seconds = graceful_timeout.as_secs(),
            "graceful shutdown timed out, aborting open connections"
        );
        server_task.abort();
        if tokio::time::timeout(force_timeout, server_task).await.is_err() {
            error!("server task did not stop after abort");
        }
        Ok(())
    }

    fn finish(
        result: Result<std::io::Result<()>, tokio::task::JoinError>,
    ) -> ServerResult<()> {
        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(error = ?e, "Server error during shutdown");
                Err(ServerError::Shutdown { source: e })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn bind(&self) -> ServerResult<TcpListener> {
        let addr = self.config.socket_addr();
        TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })
    }

    /// Handle shutdown signals and trigger coordinated cancellation
    ///
    /// This function listens for SIGINT (Ctrl+C) and SIGTERM signals,
    /// and cancels the provided cancellation token when received.
    ///
    /// # Arguments
    ///
    /// * `cancellation_token` - Token to cancel when shutdown signal is received
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
        let signal_received = async {
            #[cfg(unix)]
            #[allow(clippy::expect_used)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let mut sigterm =
                    signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
                let mut sigint =
                    signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

                tokio::select! {
                    _ = sigterm.recv() => {
                        warn!("Received SIGTERM signal, initiating coordinated shutdown");
                        "SIGTERM"
                    },
                    _ = sigint.recv() => {
                        warn!("Received SIGINT signal, initiating coordinated shutdown");
                        "SIGINT"
                    },
                }
            }

            #[cfg(not(unix))]
            #[allow(clippy::expect_used)]
            {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install CTRL+C signal handler");
                warn!("Received CTRL+C signal, initiating coordinated shutdown");
                "CTRL+C"
            }
        };

        tokio::select! {
            signal_name = signal_received => {
                warn!("Shutdown signal {} received, cancelling all operations...", signal_name);
                cancellation_token.cancel();
            },
            () = cancellation_token.cancelled() => {
                warn!("Cancellation token already cancelled, shutdown signal handler exiting");
            }
        }
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the server's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Run server for testing, returns the bound address
    ///
    /// The model is not preloaded, so the first request performs the load.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let listener = self.bind().await?;
        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        let token = self.cancellation_token.child_token();
        let task = token.child_token();
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, self.router)
                .with_graceful_shutdown(async move { task.cancelled().await })
                .await
            {
                error!(error = %err, "test server stopped with an error");
            }
        });

        Ok((actual_addr, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server state for testing
    pub fn state(&self) -> &ServerState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use age_model::ModelStatus;

    use super::*;
    use crate::config::Environment;

    #[tokio::test]
    async fn server_creation() -> ServerResult<()> {
        let config = ServerConfig::for_testing();
        let server = Server::new(config, ShutdownConfig::default())?;
        assert_eq!(server.config().environment, Environment::Testing);
        assert!(!server.cancellation_token().is_cancelled());
        assert_eq!(
            server.state().inference().status(),
            ModelStatus::Uninitialized
        );
        Ok(())
    }

    #[tokio::test]
    async fn programmatic_shutdown() -> ServerResult<()> {
        let config = ServerConfig::for_testing();
        let server = Server::new(config, ShutdownConfig::default())?;

        assert!(!server.cancellation_token().is_cancelled());

        server.shutdown();

        assert!(server.cancellation_token().is_cancelled());
        assert!(server.state().cancellation_token.is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn preload_without_artifact_keeps_server_up() -> ServerResult<()> {
        let config =
            ServerConfig::for_testing().with_artifact_path("does/not/exist/model.json");
        let server = Server::new(config, ShutdownConfig::default())?;

        server.preload_model().await;

        assert_eq!(
            server.state().inference().status(),
            ModelStatus::FailedToLoad
        );
        assert!(!server.cancellation_token().is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn testing_server_stops_on_cancellation() -> ServerResult<()> {
        let server = Server::new(ServerConfig::for_testing(), ShutdownConfig::default())?;
        let (addr, token) = server.run_for_testing().await?;

        let response = reqwest::get(format!("http://{addr}/health"))
            .await
            .expect("server answers");
        assert!(response.status().is_success());

        token.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(reqwest::get(format!("http://{addr}/health")).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn shutdown_config_default() {
        let config = ShutdownConfig::default();
        assert_eq!(
            config.graceful_timeout,
            Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS)
        );
        assert_eq!(
            config.force_timeout,
            Duration::from_secs(DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS)
        );
    }
}
