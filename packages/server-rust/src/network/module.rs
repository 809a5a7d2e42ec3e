//! Network module with deferred startup lifecycle.
//!
//! `new()` allocates shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until the shutdown future resolves. Binding
//! before serving lets callers learn the OS-assigned port first.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    create_todo, delete_todo, get_todo, health_handler, list_todos, liveness_handler,
    readiness_handler, update_todo, AppState,
};
use super::middleware::{build_http_layers, track_in_flight};
use super::shutdown::ShutdownController;
use crate::storage::RecordStore;

/// Assembles the router with all routes and middleware.
///
/// Routes:
/// - `GET|POST|PUT|DELETE /api/v1/todos` -- list, create, update, delete
/// - `GET /api/v1/todos/{id}` -- read one todo
/// - `GET /health` -- detailed health JSON
/// - `GET /health/live` -- liveness probe
/// - `GET /health/ready` -- readiness probe
///
/// Only the todo routes count as in-flight work.
pub fn build_router(state: AppState, config: &NetworkConfig) -> Router {
    let api = Router::new()
        .route(
            "/api/v1/todos",
            get(list_todos)
                .post(create_todo)
                .put(update_todo)
                .delete(delete_todo),
        )
        .route("/api/v1/todos/{id}", get(get_todo))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state.shutdown),
            track_in_flight,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .merge(api)
        .layer(build_http_layers(config))
        .with_state(state)
}

/// Manages the HTTP server lifecycle.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    store: Arc<RecordStore>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates a network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, store: Arc<RecordStore>) -> Self {
        Self {
            config,
            listener: None,
            store,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the bound port, which differs from the configured one when
    /// port 0 asks for an OS-assigned port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `shutdown` resolves, then drains.
    ///
    /// When `shutdown` fires the health state moves to Draining, so new todo
    /// requests get 503 while open ones finish. `drain_timeout` counts from
    /// that moment: connections still open when it expires are abandoned and
    /// `serve` returns with the state left at Draining.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first, or if the server
    /// hits a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let Some(listener) = self.listener else {
            anyhow::bail!("start() must be called before serve()");
        };
        let shutdown_ctrl = self.shutdown;
        let drain_timeout = self.config.drain_timeout;
        let backend = self.store.engine();

        let state = AppState {
            store: self.store,
            shutdown: Arc::clone(&shutdown_ctrl),
            start_time: Instant::now(),
        };
        let router = build_router(state, &self.config);

        let signal_ctrl = Arc::clone(&shutdown_ctrl);
        let signal = async move {
            shutdown.await;
            info!("Shutdown signal received, draining");
            signal_ctrl.trigger_shutdown();
        };

        shutdown_ctrl.set_ready();
        info!(backend, "Serving HTTP connections");

        let stopping = shutdown_ctrl.shutdown_receiver();
        let server = axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .into_future();
        tokio::pin!(server);

        let drained = tokio::select! {
            result = &mut server => {
                result?;
                shutdown_ctrl.trigger_shutdown();
                shutdown_ctrl.wait_for_drain(drain_timeout).await
            }
            () = drain_deadline(stopping, drain_timeout) => false,
        };

        if drained {
            info!("All requests drained");
        } else {
            warn!(
                in_flight = shutdown_ctrl.in_flight_count(),
                "Drain timeout expired with requests still in flight"
            );
        }
        Ok(())
    }
}

/// Resolves `drain_timeout` after shutdown is triggered.
async fn drain_deadline(mut stopping: watch::Receiver<bool>, drain_timeout: Duration) {
    let triggered = stopping.wait_for(|stop| *stop).await.is_ok();
    if !triggered {
        // Sender gone without a shutdown; only the server can end `serve`.
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(drain_timeout).await;
}
