//! # skybook-protocol
//!
//! Wire protocol for skybook.
//!
//! This crate provides:
//! - The closed vocabulary of commands and responses
//! - Line-delimited JSON encoding and decoding
//! - Per-response error codes
//! - Mapping between wire value objects and domain entities

pub mod codec;
pub mod error;
pub mod mapper;
pub mod message;

pub use codec::{Decoder, Encoder};
pub use error::{
    CreateAirplaneError, CreateBookingError, CreateFlightError, CreateScheduledFlightError,
    MappingError, ProtocolError,
};
pub use mapper::{DomainMapper, WireMapper};
pub use message::{Command, Message, MessageKind, WireMessage};

/// Default port for the skybook server.
pub const DEFAULT_PORT: u16 = 7420;

/// Maximum length of one encoded message line (1 MiB).
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Format of date-time fields on the wire.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
