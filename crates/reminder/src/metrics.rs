//! Histograms and the embedded Prometheus exporter.
//!
//! The registry is per-service (initialized in `start`, torn down in
//! `stop`), so tests and replicas never fight over global state. The
//! HTTP server exposes `GET /metrics` only and shuts down through a
//! watch channel, bounded by the caller's deadline.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus::{Histogram, HistogramOpts, Registry, TextEncoder};
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use crate::error::ReminderError;

/// Send-delay bucket boundaries in seconds: one minute out to ten hours.
pub const SEND_DELAY_BUCKETS: &[f64] = &[
    60.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0, 10800.0, 18000.0, 25200.0, 36000.0,
];

/// Bound on how long a client may hold a `/metrics` request open.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(2);

/// The reminder loop's instruments, registered on a private registry.
pub struct ReminderMetrics {
    registry: Registry,
    /// Seconds past the freshness deadline at publish time.
    pub send_delay: Histogram,
    /// Same measurement, restricted to entities seen for the first time
    /// in the current sweep.
    pub new_send_delay: Histogram,
    /// Eligible entities per published batch.
    pub batch_size: Histogram,
}

impl ReminderMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let send_delay = Histogram::with_opts(
            HistogramOpts::new(
                "reminder_send_delay_seconds",
                "Delay between an entity becoming eligible and its reminder being published",
            )
            .buckets(SEND_DELAY_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(send_delay.clone()))?;

        let new_send_delay = Histogram::with_opts(
            HistogramOpts::new(
                "reminder_new_send_delay_seconds",
                "Send delay for entities reminded for the first time in the current sweep",
            )
            .buckets(SEND_DELAY_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(new_send_delay.clone()))?;

        let batch_size = Histogram::with_opts(HistogramOpts::new(
            "reminder_batch_size",
            "Number of eligible entities per published batch",
        ))?;
        registry.register(Box::new(batch_size.clone()))?;

        Ok(Self {
            registry,
            send_delay,
            new_send_delay,
            batch_size,
        })
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

// ── HTTP server ──────────────────────────────────────────────────────

/// Handle to the running metrics HTTP server.
pub struct MetricsServer {
    shutdown_tx: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
    local_addr: SocketAddr,
}

impl MetricsServer {
    /// Bind `address` and start serving `GET /metrics`.
    ///
    /// Bind failures surface here (not inside the serving task) so the
    /// caller can treat them as fatal at startup.
    pub async fn spawn(
        address: &str,
        metrics: Arc<ReminderMetrics>,
    ) -> Result<Self, ReminderError> {
        let listener = tokio::net::TcpListener::bind(address).await?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .layer(TimeoutLayer::new(CLIENT_TIMEOUT))
            .with_state(metrics);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let mut rx = shutdown_rx;
                    while !*rx.borrow() {
                        if rx.changed().await.is_err() {
                            break;
                        }
                    }
                })
                .await
                .ok();
            info!("metrics HTTP server stopped");
        });

        info!(addr = %local_addr, "metrics HTTP server listening");
        Ok(Self {
            shutdown_tx,
            handle,
            local_addr,
        })
    }

    /// The bound address (useful when the configured port was 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signal graceful shutdown and wait up to `deadline` for the
    /// serving task to finish.
    pub async fn shutdown(self, deadline: Duration) {
        let _ = self.shutdown_tx.send(true);
        if tokio::time::timeout(deadline, self.handle).await.is_err() {
            warn!("metrics HTTP server did not stop within deadline");
        }
    }
}

/// `GET /metrics` → Prometheus text exposition.
async fn metrics_handler(State(metrics): State<Arc<ReminderMetrics>>) -> Response {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn send_delay_buckets_span_a_minute_to_ten_hours() {
        assert_eq!(SEND_DELAY_BUCKETS.first(), Some(&60.0));
        assert_eq!(SEND_DELAY_BUCKETS.last(), Some(&36000.0));
        assert!(SEND_DELAY_BUCKETS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn registry_exposes_all_three_instruments() {
        let metrics = ReminderMetrics::new().unwrap();
        metrics.send_delay.observe(120.0);
        metrics.new_send_delay.observe(120.0);
        metrics.batch_size.observe(3.0);

        let body = metrics.encode().unwrap();
        assert!(body.contains("reminder_send_delay_seconds_bucket"));
        assert!(body.contains("reminder_new_send_delay_seconds_bucket"));
        assert!(body.contains("reminder_batch_size_count"));
    }

    #[test]
    fn observations_accumulate() {
        let metrics = ReminderMetrics::new().unwrap();
        metrics.batch_size.observe(3.0);
        metrics.batch_size.observe(5.0);
        assert_eq!(metrics.batch_size.get_sample_count(), 2);
        assert_eq!(metrics.batch_size.get_sample_sum(), 8.0);
    }

    #[tokio::test]
    async fn server_serves_metrics_and_shuts_down() {
        let metrics = Arc::new(ReminderMetrics::new().unwrap());
        metrics.batch_size.observe(7.0);

        let server = MetricsServer::spawn("127.0.0.1:0", metrics).await.unwrap();
        let addr = server.local_addr();

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("reminder_batch_size_count 1"));

        server.shutdown(Duration::from_secs(5)).await;
    }
}
