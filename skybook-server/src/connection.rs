//! Per-connection command loop.
//!
//! A connection alternates strictly between reading one line and writing at
//! most one line. Lines that fail to decode, and well-formed messages that
//! have no handler, are logged and skipped without writing anything.

use crate::error::ServerError;
use crate::registry::Dispatcher;
use crate::session::{Session, SessionState};
use skybook_protocol::{Decoder, ProtocolError, MAX_LINE_BYTES};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Owns one accepted connection for its lifetime.
pub struct ConnectionHandler<S> {
    stream: BufReader<S>,
    session: Session,
    dispatcher: Arc<Dispatcher>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: impl Into<String>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            stream: BufReader::new(stream),
            session: Session::new(peer),
            dispatcher,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Serves commands until the peer disconnects or an I/O error occurs.
    ///
    /// End of stream is a clean close and returns `Ok`.
    pub async fn run(&mut self) -> Result<(), ServerError> {
        tracing::info!(
            "Client connected: {} (session {})",
            self.session.peer,
            self.session.id
        );

        let result = self.serve().await;
        self.session.set_state(SessionState::Closed);

        match &result {
            Ok(()) => tracing::info!(
                "Client disconnected: {} ({} handled, {} skipped)",
                self.session.peer,
                self.session.handled_count(),
                self.session.skipped_count()
            ),
            Err(e) if e.is_disconnect() => {
                tracing::info!("Client dropped: {} ({})", self.session.peer, e)
            }
            Err(e) => tracing::warn!("[{}] Connection closed: {}", self.session.peer, e),
        }

        result
    }

    async fn serve(&mut self) -> Result<(), ServerError> {
        let mut line = Vec::with_capacity(1024);

        loop {
            self.session.set_state(SessionState::Reading);
            line.clear();

            let limit = MAX_LINE_BYTES as u64 + 1;
            let n = (&mut self.stream)
                .take(limit)
                .read_until(b'\n', &mut line)
                .await?;
            if n == 0 {
                tracing::debug!("[{}] Connection closed by client", self.session.peer);
                return Ok(());
            }
            if line.last() != Some(&b'\n') && line.len() > MAX_LINE_BYTES {
                return Err(ProtocolError::LineTooLong {
                    size: line.len(),
                    max: MAX_LINE_BYTES,
                }
                .into());
            }

            self.handle_line(&line).await?;
        }
    }

    async fn handle_line(&mut self, line: &[u8]) -> Result<(), ServerError> {
        let message = match Decoder::decode_slice(line) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("[{}] Skipping malformed message: {}", self.session.peer, e);
                self.session.record_skipped();
                self.dispatcher.record_skipped("malformed");
                return Ok(());
            }
        };

        let kind = message.kind();
        tracing::debug!("[{}] Received {}", self.session.peer, kind);

        self.session.set_state(SessionState::Dispatching);
        let reply = match self.dispatcher.dispatch(message) {
            Some(reply) => reply,
            None => {
                tracing::warn!("[{}] No response for {}, skipping", self.session.peer, kind);
                self.session.record_skipped();
                self.dispatcher.record_skipped("unknown");
                return Ok(());
            }
        };

        self.session.set_state(SessionState::Writing);
        self.stream.write_all(&reply.line).await?;
        self.stream.flush().await?;
        self.session.record_handled();

        tracing::debug!(
            "[{}] Sent {} ({} bytes)",
            self.session.peer,
            reply.message.kind(),
            reply.line.len()
        );
        Ok(())
    }
}
