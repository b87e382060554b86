//! # skybook-server
//!
//! TCP server for skybook.
//!
//! This crate provides:
//! - The accept loop, with one task per connection
//! - The line-oriented connection handler
//! - The handler registry and one handler per command
//! - Sessions, configuration and Prometheus metrics

pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod session;

pub use config::{Config, ConfigError, MetricsConfig, NetworkConfig};
pub use connection::ConnectionHandler;
pub use error::ServerError;
pub use handler::CommandHandler;
pub use metrics::Metrics;
pub use registry::{Dispatcher, HandlerRegistry, Reply};
pub use server::{Server, ServerConfig, ServerStats};
pub use session::{Session, SessionState};
