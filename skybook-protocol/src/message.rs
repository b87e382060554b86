//! Command and response types of the skybook protocol.
//!
//! Every message is a flat struct of strings, numbers and nested value
//! objects. On the wire a message is tagged by its type name, e.g.
//! `{"FindFlightCommand":{"number":"F123"}}`.

use crate::error::{
    CreateAirplaneError, CreateBookingError, CreateFlightError, CreateScheduledFlightError,
    ProtocolError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Value objects
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightData {
    pub number: String,
    pub company: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirplaneData {
    pub id: String,
    pub model: String,
    pub rows: u32,
    pub seats_per_row: u32,
}

/// A scheduled flight with its dates in wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledFlightData {
    pub flight_number: String,
    pub airplane_id: String,
    pub departure: String,
    pub arrival: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatData {
    pub row: u32,
    pub letter: char,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerData {
    pub first_name: String,
    pub last_name: String,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFlightCommand {
    pub number: String,
    pub company: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAirplaneCommand {
    pub id: String,
    pub model: String,
    pub rows: u32,
    pub seats_per_row: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateScheduledFlightCommand {
    pub flight_number: String,
    pub airplane_id: String,
    pub departure: String,
    pub arrival: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBookingCommand {
    pub flight_number: String,
    pub departure: String,
    pub seat: SeatData,
    pub passenger: PassengerData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindFlightCommand {
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindAirplaneCommand {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindScheduledFlightCommand {
    pub flight_number: String,
    pub departure: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetFlightsCommand {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAirplanesCommand {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetScheduledFlightsCommand {}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFlightResponse {
    pub number: String,
    pub success: bool,
    pub error: Option<CreateFlightError>,
}

impl CreateFlightResponse {
    pub fn succeeded(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(number: impl Into<String>, error: CreateFlightError) -> Self {
        Self {
            number: number.into(),
            success: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAirplaneResponse {
    pub id: String,
    pub success: bool,
    pub error: Option<CreateAirplaneError>,
}

impl CreateAirplaneResponse {
    pub fn succeeded(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, error: CreateAirplaneError) -> Self {
        Self {
            id: id.into(),
            success: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateScheduledFlightResponse {
    pub flight_number: String,
    pub departure: String,
    pub success: bool,
    pub error: Option<CreateScheduledFlightError>,
}

impl CreateScheduledFlightResponse {
    pub fn succeeded(flight_number: impl Into<String>, departure: impl Into<String>) -> Self {
        Self {
            flight_number: flight_number.into(),
            departure: departure.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(
        flight_number: impl Into<String>,
        departure: impl Into<String>,
        error: CreateScheduledFlightError,
    ) -> Self {
        Self {
            flight_number: flight_number.into(),
            departure: departure.into(),
            success: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBookingResponse {
    pub flight_number: String,
    pub departure: String,
    pub seat: SeatData,
    pub success: bool,
    pub error: Option<CreateBookingError>,
}

impl CreateBookingResponse {
    pub fn succeeded(
        flight_number: impl Into<String>,
        departure: impl Into<String>,
        seat: SeatData,
    ) -> Self {
        Self {
            flight_number: flight_number.into(),
            departure: departure.into(),
            seat,
            success: true,
            error: None,
        }
    }

    pub fn failed(
        flight_number: impl Into<String>,
        departure: impl Into<String>,
        seat: SeatData,
        error: CreateBookingError,
    ) -> Self {
        Self {
            flight_number: flight_number.into(),
            departure: departure.into(),
            seat,
            success: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindFlightResponse {
    pub flight: Option<FlightData>,
    pub found: bool,
}

impl FindFlightResponse {
    pub fn found(flight: FlightData) -> Self {
        Self {
            flight: Some(flight),
            found: true,
        }
    }

    pub fn not_found() -> Self {
        Self {
            flight: None,
            found: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindAirplaneResponse {
    pub airplane: Option<AirplaneData>,
    pub found: bool,
}

impl FindAirplaneResponse {
    pub fn found(airplane: AirplaneData) -> Self {
        Self {
            airplane: Some(airplane),
            found: true,
        }
    }

    pub fn not_found() -> Self {
        Self {
            airplane: None,
            found: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindScheduledFlightResponse {
    pub scheduled_flight: Option<ScheduledFlightData>,
    pub found: bool,
}

impl FindScheduledFlightResponse {
    pub fn found(scheduled_flight: ScheduledFlightData) -> Self {
        Self {
            scheduled_flight: Some(scheduled_flight),
            found: true,
        }
    }

    pub fn not_found() -> Self {
        Self {
            scheduled_flight: None,
            found: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetFlightsResponse {
    pub flights: Vec<FlightData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAirplanesResponse {
    pub airplanes: Vec<AirplaneData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetScheduledFlightsResponse {
    pub scheduled_flights: Vec<ScheduledFlightData>,
}

// ============================================================================
// Message envelope
// ============================================================================

/// A concrete message type that can be carried inside a [`Message`].
pub trait WireMessage: Sized + Into<Message> + TryFrom<Message, Error = Message> {
    const KIND: MessageKind;
}

/// A request type, paired with the single response type it is answered with.
pub trait Command: WireMessage {
    type Response: WireMessage;
}

macro_rules! wire_messages {
    ($($name:ident),+ $(,)?) => {
        /// Every message that can travel over a skybook connection.
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub enum Message {
            $($name($name)),+
        }

        /// Shape of a message, without its payload.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum MessageKind {
            $($name),+
        }

        impl MessageKind {
            /// Every shape the decoder accepts.
            pub const ALL: &'static [MessageKind] = &[$(MessageKind::$name),+];

            /// Wire tag of the shape.
            pub fn name(&self) -> &'static str {
                match self {
                    $(MessageKind::$name => stringify!($name)),+
                }
            }
        }

        impl Message {
            pub fn kind(&self) -> MessageKind {
                match self {
                    $(Message::$name(_) => MessageKind::$name),+
                }
            }
        }

        $(
            impl WireMessage for $name {
                const KIND: MessageKind = MessageKind::$name;
            }

            impl From<$name> for Message {
                fn from(message: $name) -> Self {
                    Message::$name(message)
                }
            }

            impl TryFrom<Message> for $name {
                type Error = Message;

                fn try_from(message: Message) -> Result<Self, Message> {
                    match message {
                        Message::$name(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )+
    };
}

macro_rules! command_pairs {
    ($($command:ident => $response:ident),+ $(,)?) => {
        $(
            impl Command for $command {
                type Response = $response;
            }
        )+
    };
}

wire_messages! {
    CreateFlightCommand,
    CreateAirplaneCommand,
    CreateScheduledFlightCommand,
    CreateBookingCommand,
    FindFlightCommand,
    FindAirplaneCommand,
    FindScheduledFlightCommand,
    GetFlightsCommand,
    GetAirplanesCommand,
    GetScheduledFlightsCommand,
    CreateFlightResponse,
    CreateAirplaneResponse,
    CreateScheduledFlightResponse,
    CreateBookingResponse,
    FindFlightResponse,
    FindAirplaneResponse,
    FindScheduledFlightResponse,
    GetFlightsResponse,
    GetAirplanesResponse,
    GetScheduledFlightsResponse,
}

command_pairs! {
    CreateFlightCommand => CreateFlightResponse,
    CreateAirplaneCommand => CreateAirplaneResponse,
    CreateScheduledFlightCommand => CreateScheduledFlightResponse,
    CreateBookingCommand => CreateBookingResponse,
    FindFlightCommand => FindFlightResponse,
    FindAirplaneCommand => FindAirplaneResponse,
    FindScheduledFlightCommand => FindScheduledFlightResponse,
    GetFlightsCommand => GetFlightsResponse,
    GetAirplanesCommand => GetAirplanesResponse,
    GetScheduledFlightsCommand => GetScheduledFlightsResponse,
}

impl MessageKind {
    pub fn is_command(&self) -> bool {
        self.name().ends_with("Command")
    }

    pub fn is_response(&self) -> bool {
        self.name().ends_with("Response")
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Message {
    /// Checks the invariants serde cannot express.
    ///
    /// A create response must not carry an error code when it reports success,
    /// and a lookup response must carry a payload exactly when `found` is set.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let violated = match self {
            Message::CreateFlightResponse(r) => r.success && r.error.is_some(),
            Message::CreateAirplaneResponse(r) => r.success && r.error.is_some(),
            Message::CreateScheduledFlightResponse(r) => r.success && r.error.is_some(),
            Message::CreateBookingResponse(r) => r.success && r.error.is_some(),
            Message::FindFlightResponse(r) => r.found != r.flight.is_some(),
            Message::FindAirplaneResponse(r) => r.found != r.airplane.is_some(),
            Message::FindScheduledFlightResponse(r) => r.found != r.scheduled_flight.is_some(),
            _ => false,
        };

        if violated {
            return Err(ProtocolError::MalformedMessage(format!(
                "{} has inconsistent status fields",
                self.kind()
            )));
        }
        Ok(())
    }

    /// Returns the error code label carried by a failed create response.
    pub fn error_label(&self) -> Option<&'static str> {
        match self {
            Message::CreateFlightResponse(r) => r.error.map(|e| e.as_str()),
            Message::CreateAirplaneResponse(r) => r.error.map(|e| e.as_str()),
            Message::CreateScheduledFlightResponse(r) => r.error.map(|e| e.as_str()),
            Message::CreateBookingResponse(r) => r.error.map(|e| e.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of<C: Command>() -> (MessageKind, MessageKind) {
        (C::KIND, C::Response::KIND)
    }

    #[test]
    fn test_vocabulary_is_closed() {
        assert_eq!(MessageKind::ALL.len(), 20);
        let commands = MessageKind::ALL.iter().filter(|k| k.is_command()).count();
        let responses = MessageKind::ALL.iter().filter(|k| k.is_response()).count();
        assert_eq!(commands, 10);
        assert_eq!(responses, 10);
    }

    #[test]
    fn test_command_pairing() {
        assert_eq!(
            kind_of::<CreateFlightCommand>(),
            (
                MessageKind::CreateFlightCommand,
                MessageKind::CreateFlightResponse
            )
        );
        assert_eq!(
            kind_of::<GetScheduledFlightsCommand>(),
            (
                MessageKind::GetScheduledFlightsCommand,
                MessageKind::GetScheduledFlightsResponse
            )
        );
    }

    #[test]
    fn test_message_is_tagged_by_type_name() {
        let msg: Message = CreateFlightCommand {
            number: "F123".to_string(),
            company: "Tarom".to_string(),
        }
        .into();
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"CreateFlightCommand":{"number":"F123","company":"Tarom"}}"#
        );

        let msg: Message = CreateFlightResponse::succeeded("F123").into();
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"CreateFlightResponse":{"number":"F123","success":true,"error":null}}"#
        );

        let msg: Message = GetFlightsCommand {}.into();
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"GetFlightsCommand":{}}"#
        );
    }

    #[test]
    fn test_try_from_returns_mismatched_message() {
        let msg: Message = FindFlightCommand {
            number: "F1".to_string(),
        }
        .into();
        assert_eq!(msg.kind(), MessageKind::FindFlightCommand);

        let back = FindAirplaneCommand::try_from(msg.clone()).unwrap_err();
        assert_eq!(back, msg);

        let cmd = FindFlightCommand::try_from(msg).unwrap();
        assert_eq!(cmd.number, "F1");
    }

    #[test]
    fn test_validate_status_fields() {
        let ok: Message =
            CreateFlightResponse::failed("F1", CreateFlightError::FlightAlreadyExists).into();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.error_label(), Some("FlightAlreadyExists"));

        let bad: Message = CreateFlightResponse {
            number: "F1".to_string(),
            success: true,
            error: Some(CreateFlightError::InternalError),
        }
        .into();
        assert!(matches!(
            bad.validate(),
            Err(ProtocolError::MalformedMessage(_))
        ));

        let bad: Message = FindFlightResponse {
            flight: None,
            found: true,
        }
        .into();
        assert!(bad.validate().is_err());

        let ok: Message = FindFlightResponse::not_found().into();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.error_label(), None);
    }
}
