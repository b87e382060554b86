//! Domain error types.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Business-rule violations raised by a flight management service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("flight already exists: {number}")]
    FlightAlreadyExists { number: String },

    #[error("airplane already exists: {id}")]
    AirplaneAlreadyExists { id: String },

    #[error("scheduled flight already exists: {flight_number} departing {departure}")]
    ScheduledFlightAlreadyExists {
        flight_number: String,
        departure: NaiveDateTime,
    },

    #[error("airplane {airplane_id} is already scheduled around {departure}")]
    AirplaneAlreadyScheduled {
        airplane_id: String,
        departure: NaiveDateTime,
    },

    #[error("arrival {arrival} is not after departure {departure}")]
    ArrivalBeforeDeparture {
        departure: NaiveDateTime,
        arrival: NaiveDateTime,
    },

    #[error("flight not found: {number}")]
    FlightNotFound { number: String },

    #[error("airplane not found: {id}")]
    AirplaneNotFound { id: String },

    #[error("scheduled flight not found: {flight_number} departing {departure}")]
    ScheduledFlightNotFound {
        flight_number: String,
        departure: NaiveDateTime,
    },

    #[error("seat {seat} on {flight_number} is already booked")]
    SeatAlreadyBooked { flight_number: String, seat: String },

    #[error("seat {seat} does not exist on airplane {airplane_id}")]
    SeatOutOfRange { airplane_id: String, seat: String },

    #[error("storage error: {0}")]
    Storage(String),
}
