//! # skybook-core
//!
//! Domain model for skybook.
//!
//! This crate provides:
//! - Flight, airplane, scheduled flight and booking entities
//! - Domain error types for business-rule violations
//! - The `FlightManagementService` contract consumed by the RPC layer
//! - An in-memory reference implementation of that contract

pub mod error;
pub mod memory;
pub mod model;
pub mod service;

pub use error::CoreError;
pub use memory::InMemoryFlightService;
pub use model::{Airplane, Booking, Flight, Passenger, ScheduledFlight, Seat};
pub use service::FlightManagementService;
