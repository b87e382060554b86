//! Protocol error types and response error codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Protocol-level errors raised while framing, encoding or decoding messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("line too long: {size} bytes (max {max})")]
    LineTooLong { size: usize, max: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid UTF-8 in message")]
    InvalidUtf8,
}

/// Errors converting wire value objects into domain entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("invalid date-time in {field}: {value:?}")]
    InvalidDateTime { field: &'static str, value: String },
}

macro_rules! error_codes {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every code in the vocabulary.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire label of the code.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

error_codes! {
    /// Failure codes of `CreateFlightResponse`.
    CreateFlightError { FlightAlreadyExists, InternalError }
}

error_codes! {
    /// Failure codes of `CreateAirplaneResponse`.
    CreateAirplaneError { AirplaneAlreadyExists, InternalError }
}

error_codes! {
    /// Failure codes of `CreateScheduledFlightResponse`.
    CreateScheduledFlightError {
        ScheduledFlightAlreadyExists,
        AirplaneAlreadyScheduled,
        ArrivalBeforeDeparture,
        InternalError,
    }
}

error_codes! {
    /// Failure codes of `CreateBookingResponse`.
    CreateBookingError { InternalError }
}
