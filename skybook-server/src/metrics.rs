//! Prometheus metrics and the HTTP endpoint that exposes them.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::core::Collector;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Handler latency buckets, in seconds. Handlers call an in-process service,
/// so most observations land well under a millisecond.
const DURATION_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.01, 0.05, 0.25,
];

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Delay before retrying a failed accept.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Server-wide metric handles. Cloning shares the underlying series.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub connections_total: IntCounter,
    pub connections_active: IntGauge,
    /// Labelled by command shape.
    pub commands_total: IntCounterVec,
    /// Labelled by wire error code.
    pub command_errors_total: IntCounterVec,
    /// Labelled by `malformed` or `unknown`.
    pub skipped_messages_total: IntCounterVec,
    pub command_duration: HistogramVec,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

fn register<C>(registry: &Registry, collector: C) -> Result<C, prometheus::Error>
where
    C: Collector + Clone + 'static,
{
    registry.register(Box::new(collector.clone()))?;
    Ok(collector)
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("skybook".to_string()), None)?;

        Ok(Self {
            connections_total: register(
                &registry,
                IntCounter::new("connections_total", "Connections accepted")?,
            )?,
            connections_active: register(
                &registry,
                IntGauge::new("connections_active", "Connections currently open")?,
            )?,
            commands_total: register(
                &registry,
                IntCounterVec::new(
                    Opts::new("commands_total", "Commands answered"),
                    &["command"],
                )?,
            )?,
            command_errors_total: register(
                &registry,
                IntCounterVec::new(
                    Opts::new("command_errors_total", "Create responses carrying an error code"),
                    &["code"],
                )?,
            )?,
            skipped_messages_total: register(
                &registry,
                IntCounterVec::new(
                    Opts::new("skipped_messages_total", "Lines dropped without a response"),
                    &["reason"],
                )?,
            )?,
            command_duration: register(
                &registry,
                HistogramVec::new(
                    HistogramOpts::new("command_duration_seconds", "Time spent in handlers")
                        .buckets(DURATION_BUCKETS.to_vec()),
                    &["command"],
                )?,
            )?,
            registry,
        })
    }

    /// Renders every series in the Prometheus text exposition format.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut out) {
            tracing::warn!("Failed to encode metrics: {}", e);
        }
        out
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Binds `addr` and serves metrics until shutdown.
pub async fn run_metrics_server(
    addr: SocketAddr,
    metrics: Arc<Metrics>,
    shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_metrics(listener, metrics, shutdown).await;
    Ok(())
}

/// Serves `/metrics` and `/health` on an already bound listener.
///
/// Accept errors are logged and retried after a short pause; they do
/// not stop the endpoint.
pub async fn serve_metrics(
    listener: TcpListener,
    metrics: Arc<Metrics>,
    mut shutdown: broadcast::Receiver<()>,
) {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Metrics available at http://{}/metrics", addr);
    }

    loop {
        let stream = tokio::select! {
            (stream, _) = accept_next(|| listener.accept()) => stream,
            _ = shutdown.recv() => break,
        };

        let metrics = metrics.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                let response = route(req.uri().path(), &metrics);
                async move { Ok::<_, Infallible>(response) }
            });
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::debug!("Metrics connection ended with error: {}", e);
            }
        });
    }

    tracing::debug!("Metrics endpoint stopped");
}

/// Calls `accept` until it succeeds, pausing after each failure.
async fn accept_next<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                tracing::warn!("Metrics endpoint accept failed: {}", e);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

fn route(path: &str, metrics: &Metrics) -> Response<Full<Bytes>> {
    match path {
        "/metrics" => reply(
            StatusCode::OK,
            "text/plain; version=0.0.4; charset=utf-8",
            metrics.encode().into(),
        ),
        "/health" | "/healthz" => reply(StatusCode::OK, TEXT_PLAIN, Bytes::from_static(b"OK")),
        _ => reply(
            StatusCode::NOT_FOUND,
            TEXT_PLAIN,
            Bytes::from_static(b"Not Found"),
        ),
    }
}

fn reply(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[test]
    fn test_series_are_prefixed() {
        let metrics = Metrics::new().unwrap();
        metrics.connections_total.inc();
        metrics.connections_active.inc();
        metrics
            .command_errors_total
            .with_label_values(&["FlightAlreadyExists"])
            .inc();
        metrics
            .command_duration
            .with_label_values(&["CreateFlightCommand"])
            .observe(0.0002);

        let text = String::from_utf8(metrics.encode()).unwrap();
        assert!(text.contains("skybook_connections_total 1"));
        assert!(text.contains("skybook_connections_active 1"));
        assert!(text.contains("skybook_command_errors_total{code=\"FlightAlreadyExists\"} 1"));
        assert!(text.contains("skybook_command_duration_seconds_bucket"));
    }

    #[test]
    fn test_instances_are_independent() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.connections_total.inc();
        assert_eq!(second.connections_total.get(), 0);
    }

    #[test]
    fn test_routes() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(route("/metrics", &metrics).status(), StatusCode::OK);
        assert_eq!(route("/healthz", &metrics).status(), StatusCode::OK);
        assert_eq!(route("/", &metrics).status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_accept_errors_back_off() {
        let mut failures = 3;
        let started = std::time::Instant::now();

        let accepted = accept_next(|| {
            let result = if failures > 0 {
                failures -= 1;
                Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "too many open files",
                ))
            } else {
                Ok(7)
            };
            async move { result }
        })
        .await;

        assert_eq!(accepted, 7);
        assert_eq!(failures, 0);
        assert!(started.elapsed() >= ACCEPT_BACKOFF * 3);
    }

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_http_endpoint() {
        let metrics = Arc::new(Metrics::new().unwrap());
        metrics.connections_total.inc();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(serve_metrics(listener, metrics, shutdown_rx));

        let response = get(addr, "/metrics").await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("skybook_connections_total 1"));

        let response = get(addr, "/health").await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("OK"));

        assert!(get(addr, "/nope").await.starts_with("HTTP/1.1 404"));

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }
}
