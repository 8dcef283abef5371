//! Prometheus metrics and the metrics/probes HTTP server.
//!
//! Serves:
//! - `GET /metrics`: reconcile counters and durations in text exposition format
//! - `GET /healthz`: liveness, always ok while the process serves requests
//! - `GET /readyz`: ready once the watchers have been started

use crate::error::ControllerError;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// Reconcile metrics
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    reconciles: IntCounterVec,
    duration: HistogramVec,
    ready: Arc<AtomicBool>,
}

impl Metrics {
    pub fn new() -> Result<Self, ControllerError> {
        let registry = Registry::new();

        let reconciles = IntCounterVec::new(
            Opts::new("ktwin_reconcile_total", "Reconcile passes by kind and result"),
            &["kind", "result"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new("ktwin_reconcile_duration_seconds", "Reconcile pass duration"),
            &["kind"],
        )?;

        registry.register(Box::new(reconciles.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            reconciles,
            duration,
            ready: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Count one reconcile pass of `kind`
    pub fn record_reconcile(&self, kind: &str, success: bool, seconds: f64) {
        let result = if success { "success" } else { "error" };
        self.reconciles.with_label_values(&[kind, result]).inc();
        self.duration.with_label_values(&[kind]).observe(seconds);
    }

    /// Flip `/readyz` to ok
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String, ControllerError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| ControllerError::Metrics(prometheus::Error::Msg(e.to_string())))
    }
}

/// Router for the metrics and probe endpoints
pub fn router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/metrics", get(serve_metrics))
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(serve_readiness))
        .with_state(metrics)
}

/// Serve the metrics and probe endpoints until the process exits
pub async fn serve(addr: SocketAddr, metrics: Arc<Metrics>) -> Result<(), ControllerError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Metrics and probes listening on {}", addr);
    axum::serve(listener, router(metrics)).await?;
    Ok(())
}

async fn serve_metrics(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    match metrics.render() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                e.to_string(),
            )
        }
    }
}

async fn serve_readiness(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    if metrics.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "starting")
    }
}
