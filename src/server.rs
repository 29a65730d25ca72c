//! Metrics endpoint: serves [`AggregateCounters::snapshot`] on `GET /metrics`, 404 elsewhere.
//!
//! The server owns a dedicated thread running a tokio runtime, so the scan loop stays
//! synchronous. Start binds before returning; stop (or drop) shuts down gracefully and joins.

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use log::{debug, error, info};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;

use crate::engine::counters::AggregateCounters;
use crate::utils::config::METRICS_PATH;

/// Content type of the text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

async fn metrics(State(counters): State<Arc<AggregateCounters>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        counters.snapshot(),
    )
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Routes for the endpoint, sharing `counters` with whoever folds into them.
pub fn router(counters: Arc<AggregateCounters>) -> Router {
    Router::new()
        .route(METRICS_PATH, get(metrics))
        .fallback(not_found)
        .with_state(counters)
}

/// Running metrics endpoint.
pub struct MetricsServer {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MetricsServer {
    /// Bind `addr` and start serving. Bind errors are returned here, not logged later.
    pub fn start(addr: SocketAddr, counters: Arc<AggregateCounters>) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).with_context(|| format!("bind metrics endpoint on {addr}"))?;
        listener
            .set_nonblocking(true)
            .context("set metrics listener nonblocking")?;
        let local_addr = listener.local_addr().context("metrics listener address")?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .context("start tokio runtime for metrics endpoint")?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(counters);

        let handle = thread::Builder::new()
            .name("metrics-server".to_string())
            .spawn(move || {
                let served = runtime.block_on(async move {
                    let listener = tokio::net::TcpListener::from_std(listener)?;
                    axum::serve(listener, app)
                        .with_graceful_shutdown(async move {
                            let _ = shutdown_rx.await;
                        })
                        .await
                });
                if let Err(e) = served {
                    error!("Metrics endpoint stopped: {}", e);
                }
                debug!("Metrics endpoint thread exiting");
            })
            .context("spawn metrics endpoint thread")?;

        info!("Serving metrics on http://{}{}", local_addr, METRICS_PATH);
        Ok(Self {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, finish in-flight requests and join the server thread.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Metrics endpoint thread panicked");
            }
            info!("Metrics endpoint on {} stopped", self.local_addr);
        }
    }
}

impl Drop for MetricsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
