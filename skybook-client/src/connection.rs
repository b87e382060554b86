//! Connection management.

use crate::error::ClientError;
use skybook_protocol::{
    Command, Decoder, Encoder, Message, ProtocolError, WireMessage, MAX_LINE_BYTES,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address.
    pub addr: SocketAddr,
    /// Bounds the TCP connect only. Exchanges wait for the server indefinitely.
    pub connect_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// A connection to a skybook server.
///
/// Exchanges are serialized: one command line is written and exactly one
/// response line is read before the next command may be sent.
pub struct Connection {
    config: ConnectionConfig,
    stream: Mutex<Option<BufReader<TcpStream>>>,
    connected: AtomicBool,
}

impl Connection {
    /// Creates a new connection (not yet connected).
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            stream: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Connects to the server.
    pub async fn connect(&self) -> Result<(), ClientError> {
        tracing::debug!("Connecting to {}...", self.config.addr);

        let stream = tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(self.config.addr),
        )
        .await
        .map_err(|_| {
            tracing::debug!("Connection timeout");
            ClientError::Timeout
        })?
        .map_err(|e| {
            tracing::debug!("Connection failed: {}", e);
            ClientError::Io(e)
        })?;

        stream.set_nodelay(true).ok();

        *self.stream.lock().await = Some(BufReader::new(stream));
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!("Connected to {}", self.config.addr);
        Ok(())
    }

    /// Sends one message and waits for the single line answering it.
    ///
    /// End of stream before a full response is `ConnectionClosed` and leaves
    /// the connection disconnected. A response line longer than
    /// `MAX_LINE_BYTES` is `LineTooLong`; the rest of that line is skipped so
    /// the connection stays usable.
    pub async fn send(&self, message: Message) -> Result<Message, ClientError> {
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(ClientError::NotConnected)?;

        let kind = message.kind();
        let encoded = Encoder::encode_line(&message)?;
        let sent = async {
            stream.get_mut().write_all(&encoded).await?;
            stream.get_mut().flush().await
        }
        .await;
        if let Err(e) = sent {
            self.drop_stream(&mut guard);
            return Err(ClientError::Io(e));
        }
        tracing::debug!("Sent {} ({} bytes), waiting for response...", kind, encoded.len());

        let mut line = Vec::with_capacity(256);
        let read = (&mut *stream)
            .take(MAX_LINE_BYTES as u64 + 1)
            .read_until(b'\n', &mut line)
            .await;
        match read {
            Ok(_) if line.last() == Some(&b'\n') => {
                let response = Decoder::decode_slice(&line)?;
                tracing::debug!("Received {}", response.kind());
                Ok(response)
            }
            Ok(_) if line.len() > MAX_LINE_BYTES => {
                tracing::warn!(
                    "{} response exceeds {} bytes, discarding it",
                    kind,
                    MAX_LINE_BYTES
                );
                if !matches!(skip_line(stream).await, Ok(true)) {
                    self.drop_stream(&mut guard);
                }
                Err(ProtocolError::LineTooLong {
                    size: line.len(),
                    max: MAX_LINE_BYTES,
                }
                .into())
            }
            Ok(_) => {
                tracing::debug!("Connection closed while waiting for {} response", kind);
                self.drop_stream(&mut guard);
                Err(ClientError::ConnectionClosed)
            }
            Err(e) => {
                self.drop_stream(&mut guard);
                Err(ClientError::Io(e))
            }
        }
    }

    /// Sends a typed command and decodes its paired response.
    pub async fn send_command<C: Command>(&self, command: C) -> Result<C::Response, ClientError> {
        let response = self.send(command.into()).await?;
        C::Response::try_from(response).map_err(|other| ClientError::UnexpectedResponse {
            expected: C::Response::KIND.name(),
            actual: other.kind().name(),
        })
    }

    fn drop_stream(&self, guard: &mut Option<BufReader<TcpStream>>) {
        guard.take();
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Returns whether the connection is established.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Closes the connection.
    pub async fn close(&self) -> Result<(), ClientError> {
        self.connected.store(false, Ordering::SeqCst);
        if let Some(mut stream) = self.stream.lock().await.take() {
            tracing::debug!("Shutting down connection to {}", self.config.addr);
            let _ = stream.get_mut().shutdown().await;
        }
        Ok(())
    }
}

/// Consumes input up to and including the next `\n`.
///
/// Returns `false` if the stream ended first.
async fn skip_line(stream: &mut BufReader<TcpStream>) -> std::io::Result<bool> {
    loop {
        let (consumed, found) = {
            let buf = stream.fill_buf().await?;
            if buf.is_empty() {
                return Ok(false);
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(end) => (end + 1, true),
                None => (buf.len(), false),
            }
        };
        stream.consume(consumed);
        if found {
            return Ok(true);
        }
    }
}
