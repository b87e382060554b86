//! Client error types.

use skybook_core::CoreError;
use thiserror::Error;

/// Client errors.
///
/// Transport faults (`Io`, `Protocol`, `NotConnected`, `ConnectionClosed`,
/// `Timeout`, `UnexpectedResponse`) mean no usable answer arrived. The
/// remaining variants carry an answer from the server.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] skybook_protocol::ProtocolError),

    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("connect timeout")]
    Timeout,

    #[error("unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid data in response: {0}")]
    Mapping(#[from] skybook_protocol::MappingError),

    #[error(transparent)]
    Domain(CoreError),

    #[error("server error: {}", .0.unwrap_or("unspecified"))]
    Server(Option<&'static str>),

    #[error("not found: {0}")]
    NotFound(String),
}

impl ClientError {
    /// Returns whether the server rejected the request on a business rule.
    pub fn is_domain(&self) -> bool {
        matches!(self, ClientError::Domain(_))
    }

    /// Returns whether the exchange failed before a response was decoded.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_)
                | ClientError::Protocol(_)
                | ClientError::NotConnected
                | ClientError::ConnectionClosed
                | ClientError::Timeout
                | ClientError::UnexpectedResponse { .. }
        )
    }
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        ClientError::Domain(err)
    }
}
