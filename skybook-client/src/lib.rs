//! # skybook-client
//!
//! Client library for skybook.
//!
//! This crate provides:
//! - A TCP connection that exchanges one command line for one response line
//! - A typed API mirroring the flight management service
//! - Translation of wire error codes back into domain errors

pub mod client;
pub mod connection;
pub mod error;

pub use client::Client;
pub use connection::{Connection, ConnectionConfig};
pub use error::ClientError;
