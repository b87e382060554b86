//! TCP listener.

use crate::connection::ConnectionHandler;
use crate::error::ServerError;
use crate::metrics::Metrics;
use crate::registry::Dispatcher;
use skybook_core::FlightManagementService;
use skybook_protocol::{DomainMapper, WireMapper, DEFAULT_PORT};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Listener settings.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Shared with the metrics endpoint when set.
    pub metrics: Option<Arc<Metrics>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT))
    }
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Connection counters of one server.
#[derive(Debug, Default)]
pub struct ServerStats {
    accepted: AtomicU64,
    open: AtomicU64,
    failed: AtomicU64,
}

impl ServerStats {
    /// Connections accepted since start.
    pub fn connections_total(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Connections whose handler is still running.
    pub fn connections_active(&self) -> u64 {
        self.open.load(Ordering::Relaxed)
    }

    /// Connections that ended on an I/O or framing error.
    pub fn connection_errors(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Counts one open connection until dropped, even if its task panics.
struct OpenConnection {
    stats: Arc<ServerStats>,
    metrics: Option<Arc<Metrics>>,
}

impl OpenConnection {
    fn open(stats: Arc<ServerStats>, metrics: Option<Arc<Metrics>>) -> Self {
        stats.accepted.fetch_add(1, Ordering::Relaxed);
        stats.open.fetch_add(1, Ordering::Relaxed);
        if let Some(metrics) = &metrics {
            metrics.connections_total.inc();
            metrics.connections_active.inc();
        }
        Self { stats, metrics }
    }

    fn failed(&self) {
        self.stats.failed.fetch_add(1, Ordering::Relaxed);
    }
}

impl Drop for OpenConnection {
    fn drop(&mut self) {
        self.stats.open.fetch_sub(1, Ordering::Relaxed);
        if let Some(metrics) = &self.metrics {
            metrics.connections_active.dec();
        }
    }
}

/// TCP server for skybook.
///
/// Each accepted connection is served by its own task. Stopping the server
/// stops accepting; connections already accepted run until their peer leaves.
pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    stats: Arc<ServerStats>,
    stop: broadcast::Sender<()>,
    listening: AtomicBool,
    local_addr: parking_lot::Mutex<Option<SocketAddr>>,
}

impl Server {
    /// Creates a new server using the standard wire mapper.
    pub fn new(config: ServerConfig, service: Arc<dyn FlightManagementService>) -> Self {
        Self::with_mapper(config, service, Arc::new(WireMapper::new()))
    }

    /// Creates a new server with a custom domain mapper.
    pub fn with_mapper(
        config: ServerConfig,
        service: Arc<dyn FlightManagementService>,
        mapper: Arc<dyn DomainMapper>,
    ) -> Self {
        let (stop, _) = broadcast::channel(1);
        let mut dispatcher = Dispatcher::new(service, mapper);
        if let Some(ref metrics) = config.metrics {
            dispatcher = dispatcher.with_metrics(metrics.clone());
        }
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
            stats: Arc::new(ServerStats::default()),
            stop,
            listening: AtomicBool::new(false),
            local_addr: parking_lot::Mutex::new(None),
        }
    }

    /// Binds the configured address and runs the accept loop.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Runs the accept loop on an already bound listener.
    ///
    /// Returns `Ok` after [`Server::shutdown`], or the accept error that
    /// stopped the loop.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        *self.local_addr.lock() = Some(addr);

        let mut stop = self.stop.subscribe();
        self.listening.store(true, Ordering::SeqCst);
        tracing::info!("Server listening on {}", addr);

        let mut result = Ok(());
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_connection(stream, peer),
                        Err(e) => {
                            tracing::error!("Accept error, no longer listening: {}", e);
                            result = Err(ServerError::Accept(e));
                            break;
                        }
                    }
                }
                _ = stop.recv() => {
                    tracing::info!("Stopped accepting connections on {}", addr);
                    break;
                }
            }
        }

        self.listening.store(false, Ordering::SeqCst);
        result
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let open = OpenConnection::open(self.stats.clone(), self.config.metrics.clone());
        let dispatcher = self.dispatcher.clone();

        tokio::spawn(async move {
            let mut connection = ConnectionHandler::new(stream, peer.to_string(), dispatcher);
            if connection.run().await.is_err() {
                open.failed();
            }
        });
    }

    /// Stops accepting new connections.
    pub fn shutdown(&self) {
        let _ = self.stop.send(());
    }

    /// Returns whether the accept loop is running.
    pub fn is_running(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Returns the bound address once the server has started listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}
