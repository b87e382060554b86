//! Command handlers.
//!
//! One handler per command shape. A handler maps the wire command to service
//! arguments, calls the service and builds the paired response. Domain faults
//! the operation is documented to raise become response error codes; every
//! other failure becomes `InternalError`.

use skybook_core::{Airplane, Booking, CoreError, Flight, FlightManagementService};
use skybook_protocol::message::*;
use skybook_protocol::{
    Command, CreateAirplaneError, CreateBookingError, CreateFlightError,
    CreateScheduledFlightError, DomainMapper,
};

/// Handles one command shape.
///
/// `handle` must always produce a response. `fallback` is the response sent
/// when `handle` panics, and must not touch the service.
pub trait CommandHandler {
    type Command: Command;

    fn handle(
        command: &Self::Command,
        service: &dyn FlightManagementService,
        mapper: &dyn DomainMapper,
    ) -> <Self::Command as Command>::Response;

    fn fallback(command: &Self::Command) -> <Self::Command as Command>::Response;
}

pub struct CreateFlightHandler;

impl CommandHandler for CreateFlightHandler {
    type Command = CreateFlightCommand;

    fn handle(
        command: &CreateFlightCommand,
        service: &dyn FlightManagementService,
        _mapper: &dyn DomainMapper,
    ) -> CreateFlightResponse {
        let flight = Flight::new(command.number.clone(), command.company.clone());
        match service.create_flight(flight) {
            Ok(()) => CreateFlightResponse::succeeded(&command.number),
            Err(e) => {
                tracing::warn!("CreateFlight {} failed: {}", command.number, e);
                CreateFlightResponse::failed(&command.number, create_flight_error(&e))
            }
        }
    }

    fn fallback(command: &CreateFlightCommand) -> CreateFlightResponse {
        CreateFlightResponse::failed(&command.number, CreateFlightError::InternalError)
    }
}

fn create_flight_error(err: &CoreError) -> CreateFlightError {
    match err {
        CoreError::FlightAlreadyExists { .. } => CreateFlightError::FlightAlreadyExists,
        _ => CreateFlightError::InternalError,
    }
}

pub struct CreateAirplaneHandler;

impl CommandHandler for CreateAirplaneHandler {
    type Command = CreateAirplaneCommand;

    fn handle(
        command: &CreateAirplaneCommand,
        service: &dyn FlightManagementService,
        _mapper: &dyn DomainMapper,
    ) -> CreateAirplaneResponse {
        let airplane = Airplane::new(
            command.id.clone(),
            command.model.clone(),
            command.rows,
            command.seats_per_row,
        );
        match service.create_airplane(airplane) {
            Ok(()) => CreateAirplaneResponse::succeeded(&command.id),
            Err(e) => {
                tracing::warn!("CreateAirplane {} failed: {}", command.id, e);
                CreateAirplaneResponse::failed(&command.id, create_airplane_error(&e))
            }
        }
    }

    fn fallback(command: &CreateAirplaneCommand) -> CreateAirplaneResponse {
        CreateAirplaneResponse::failed(&command.id, CreateAirplaneError::InternalError)
    }
}

fn create_airplane_error(err: &CoreError) -> CreateAirplaneError {
    match err {
        CoreError::AirplaneAlreadyExists { .. } => CreateAirplaneError::AirplaneAlreadyExists,
        _ => CreateAirplaneError::InternalError,
    }
}

pub struct CreateScheduledFlightHandler;

impl CommandHandler for CreateScheduledFlightHandler {
    type Command = CreateScheduledFlightCommand;

    fn handle(
        command: &CreateScheduledFlightCommand,
        service: &dyn FlightManagementService,
        mapper: &dyn DomainMapper,
    ) -> CreateScheduledFlightResponse {
        let data = ScheduledFlightData {
            flight_number: command.flight_number.clone(),
            airplane_id: command.airplane_id.clone(),
            departure: command.departure.clone(),
            arrival: command.arrival.clone(),
        };

        let result = match mapper.scheduled_flight_from_wire(&data) {
            Ok(scheduled) => service
                .create_scheduled_flight(scheduled)
                .map_err(|e| (e.to_string(), create_scheduled_flight_error(&e))),
            Err(e) => Err((
                e.to_string(),
                CreateScheduledFlightError::InternalError,
            )),
        };

        match result {
            Ok(()) => {
                CreateScheduledFlightResponse::succeeded(&command.flight_number, &command.departure)
            }
            Err((reason, code)) => {
                tracing::warn!(
                    "CreateScheduledFlight {} at {} failed: {}",
                    command.flight_number,
                    command.departure,
                    reason
                );
                CreateScheduledFlightResponse::failed(
                    &command.flight_number,
                    &command.departure,
                    code,
                )
            }
        }
    }

    fn fallback(command: &CreateScheduledFlightCommand) -> CreateScheduledFlightResponse {
        CreateScheduledFlightResponse::failed(
            &command.flight_number,
            &command.departure,
            CreateScheduledFlightError::InternalError,
        )
    }
}

/// Arms are ordered by priority: conflicts on the schedule key first, then
/// airplane conflicts, then time ordering.
fn create_scheduled_flight_error(err: &CoreError) -> CreateScheduledFlightError {
    match err {
        CoreError::ScheduledFlightAlreadyExists { .. } => {
            CreateScheduledFlightError::ScheduledFlightAlreadyExists
        }
        CoreError::AirplaneAlreadyScheduled { .. } => {
            CreateScheduledFlightError::AirplaneAlreadyScheduled
        }
        CoreError::ArrivalBeforeDeparture { .. } => {
            CreateScheduledFlightError::ArrivalBeforeDeparture
        }
        _ => CreateScheduledFlightError::InternalError,
    }
}

pub struct CreateBookingHandler;

impl CommandHandler for CreateBookingHandler {
    type Command = CreateBookingCommand;

    fn handle(
        command: &CreateBookingCommand,
        service: &dyn FlightManagementService,
        mapper: &dyn DomainMapper,
    ) -> CreateBookingResponse {
        let result = mapper
            .parse_date_time("departure", &command.departure)
            .map_err(|e| e.to_string())
            .and_then(|departure| {
                let booking = Booking::new(
                    command.flight_number.clone(),
                    departure,
                    mapper.seat_from_wire(&command.seat),
                    mapper.passenger_from_wire(&command.passenger),
                );
                service.create_booking(booking).map_err(|e| e.to_string())
            });

        match result {
            Ok(()) => CreateBookingResponse::succeeded(
                &command.flight_number,
                &command.departure,
                command.seat,
            ),
            Err(reason) => {
                tracing::warn!(
                    "CreateBooking {} at {} seat {}{} failed: {}",
                    command.flight_number,
                    command.departure,
                    command.seat.row,
                    command.seat.letter,
                    reason
                );
                Self::fallback(command)
            }
        }
    }

    fn fallback(command: &CreateBookingCommand) -> CreateBookingResponse {
        CreateBookingResponse::failed(
            &command.flight_number,
            &command.departure,
            command.seat,
            CreateBookingError::InternalError,
        )
    }
}

pub struct FindFlightHandler;

impl CommandHandler for FindFlightHandler {
    type Command = FindFlightCommand;

    fn handle(
        command: &FindFlightCommand,
        service: &dyn FlightManagementService,
        mapper: &dyn DomainMapper,
    ) -> FindFlightResponse {
        match service.find_flight(&command.number) {
            Some(flight) => FindFlightResponse::found(mapper.flight_to_wire(&flight)),
            None => FindFlightResponse::not_found(),
        }
    }

    fn fallback(_command: &FindFlightCommand) -> FindFlightResponse {
        FindFlightResponse::not_found()
    }
}

pub struct FindAirplaneHandler;

impl CommandHandler for FindAirplaneHandler {
    type Command = FindAirplaneCommand;

    fn handle(
        command: &FindAirplaneCommand,
        service: &dyn FlightManagementService,
        mapper: &dyn DomainMapper,
    ) -> FindAirplaneResponse {
        match service.find_airplane(&command.id) {
            Some(airplane) => FindAirplaneResponse::found(mapper.airplane_to_wire(&airplane)),
            None => FindAirplaneResponse::not_found(),
        }
    }

    fn fallback(_command: &FindAirplaneCommand) -> FindAirplaneResponse {
        FindAirplaneResponse::not_found()
    }
}

pub struct FindScheduledFlightHandler;

impl CommandHandler for FindScheduledFlightHandler {
    type Command = FindScheduledFlightCommand;

    fn handle(
        command: &FindScheduledFlightCommand,
        service: &dyn FlightManagementService,
        mapper: &dyn DomainMapper,
    ) -> FindScheduledFlightResponse {
        let departure = match mapper.parse_date_time("departure", &command.departure) {
            Ok(departure) => departure,
            Err(e) => {
                tracing::warn!("FindScheduledFlight {}: {}", command.flight_number, e);
                return FindScheduledFlightResponse::not_found();
            }
        };

        match service.find_scheduled_flight(&command.flight_number, departure) {
            Some(scheduled) => {
                FindScheduledFlightResponse::found(mapper.scheduled_flight_to_wire(&scheduled))
            }
            None => FindScheduledFlightResponse::not_found(),
        }
    }

    fn fallback(_command: &FindScheduledFlightCommand) -> FindScheduledFlightResponse {
        FindScheduledFlightResponse::not_found()
    }
}

pub struct GetFlightsHandler;

impl CommandHandler for GetFlightsHandler {
    type Command = GetFlightsCommand;

    fn handle(
        _command: &GetFlightsCommand,
        service: &dyn FlightManagementService,
        mapper: &dyn DomainMapper,
    ) -> GetFlightsResponse {
        GetFlightsResponse {
            flights: service
                .get_flights()
                .iter()
                .map(|f| mapper.flight_to_wire(f))
                .collect(),
        }
    }

    fn fallback(_command: &GetFlightsCommand) -> GetFlightsResponse {
        GetFlightsResponse::default()
    }
}

pub struct GetAirplanesHandler;

impl CommandHandler for GetAirplanesHandler {
    type Command = GetAirplanesCommand;

    fn handle(
        _command: &GetAirplanesCommand,
        service: &dyn FlightManagementService,
        mapper: &dyn DomainMapper,
    ) -> GetAirplanesResponse {
        GetAirplanesResponse {
            airplanes: service
                .get_airplanes()
                .iter()
                .map(|a| mapper.airplane_to_wire(a))
                .collect(),
        }
    }

    fn fallback(_command: &GetAirplanesCommand) -> GetAirplanesResponse {
        GetAirplanesResponse::default()
    }
}

pub struct GetScheduledFlightsHandler;

impl CommandHandler for GetScheduledFlightsHandler {
    type Command = GetScheduledFlightsCommand;

    fn handle(
        _command: &GetScheduledFlightsCommand,
        service: &dyn FlightManagementService,
        mapper: &dyn DomainMapper,
    ) -> GetScheduledFlightsResponse {
        GetScheduledFlightsResponse {
            scheduled_flights: service
                .get_scheduled_flights()
                .iter()
                .map(|s| mapper.scheduled_flight_to_wire(s))
                .collect(),
        }
    }

    fn fallback(_command: &GetScheduledFlightsCommand) -> GetScheduledFlightsResponse {
        GetScheduledFlightsResponse::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use skybook_core::{InMemoryFlightService, ScheduledFlight};
    use skybook_protocol::WireMapper;

    /// Service whose create operations all fail with the same error.
    struct FailingService(CoreError);

    impl FlightManagementService for FailingService {
        fn create_flight(&self, _: Flight) -> Result<(), CoreError> {
            Err(self.0.clone())
        }
        fn create_airplane(&self, _: Airplane) -> Result<(), CoreError> {
            Err(self.0.clone())
        }
        fn create_scheduled_flight(&self, _: ScheduledFlight) -> Result<(), CoreError> {
            Err(self.0.clone())
        }
        fn create_booking(&self, _: Booking) -> Result<(), CoreError> {
            Err(self.0.clone())
        }
        fn find_flight(&self, _: &str) -> Option<Flight> {
            None
        }
        fn find_airplane(&self, _: &str) -> Option<Airplane> {
            None
        }
        fn find_scheduled_flight(&self, _: &str, _: NaiveDateTime) -> Option<ScheduledFlight> {
            None
        }
        fn get_flights(&self) -> Vec<Flight> {
            Vec::new()
        }
        fn get_airplanes(&self) -> Vec<Airplane> {
            Vec::new()
        }
        fn get_scheduled_flights(&self) -> Vec<ScheduledFlight> {
            Vec::new()
        }
    }

    fn storage_failure() -> FailingService {
        FailingService(CoreError::Storage("connection refused".to_string()))
    }

    fn create_flight(number: &str) -> CreateFlightCommand {
        CreateFlightCommand {
            number: number.to_string(),
            company: "Tarom".to_string(),
        }
    }

    fn schedule(
        number: &str,
        airplane: &str,
        departure: &str,
        arrival: &str,
    ) -> CreateScheduledFlightCommand {
        CreateScheduledFlightCommand {
            flight_number: number.to_string(),
            airplane_id: airplane.to_string(),
            departure: departure.to_string(),
            arrival: arrival.to_string(),
        }
    }

    fn seeded() -> InMemoryFlightService {
        let service = InMemoryFlightService::new();
        service.create_flight(Flight::new("F123", "Tarom")).unwrap();
        service.create_flight(Flight::new("F456", "Tarom")).unwrap();
        service
            .create_airplane(Airplane::new("YR-ABC", "A320", 30, 6))
            .unwrap();
        service
    }

    #[test]
    fn test_create_flight() {
        let service = InMemoryFlightService::new();
        let mapper = WireMapper::new();

        let response = CreateFlightHandler::handle(&create_flight("F123"), &service, &mapper);
        assert_eq!(
            response,
            CreateFlightResponse {
                number: "F123".to_string(),
                success: true,
                error: None,
            }
        );

        let response = CreateFlightHandler::handle(&create_flight("F123"), &service, &mapper);
        assert!(!response.success);
        assert_eq!(response.error, Some(CreateFlightError::FlightAlreadyExists));
    }

    #[test]
    fn test_unclassified_failures_become_internal_error() {
        let service = storage_failure();
        let mapper = WireMapper::new();

        let response = CreateFlightHandler::handle(&create_flight("F1"), &service, &mapper);
        assert_eq!(response.error, Some(CreateFlightError::InternalError));

        let response = CreateAirplaneHandler::handle(
            &CreateAirplaneCommand {
                id: "YR-ABC".to_string(),
                model: "A320".to_string(),
                rows: 30,
                seats_per_row: 6,
            },
            &service,
            &mapper,
        );
        assert_eq!(response.error, Some(CreateAirplaneError::InternalError));

        let response = CreateScheduledFlightHandler::handle(
            &schedule("F1", "YR-ABC", "2024-05-01T08:00:00", "2024-05-01T10:00:00"),
            &service,
            &mapper,
        );
        assert_eq!(response.error, Some(CreateScheduledFlightError::InternalError));
    }

    #[test]
    fn test_undocumented_domain_faults_become_internal_error() {
        // FlightNotFound is not in the CreateScheduledFlight vocabulary
        let service = FailingService(CoreError::FlightNotFound {
            number: "F1".to_string(),
        });
        let response = CreateScheduledFlightHandler::handle(
            &schedule("F1", "YR-ABC", "2024-05-01T08:00:00", "2024-05-01T10:00:00"),
            &service,
            &WireMapper::new(),
        );
        assert_eq!(response.error, Some(CreateScheduledFlightError::InternalError));
    }

    #[test]
    fn test_scheduled_flight_error_translation() {
        let mapper = WireMapper::new();
        let departure: NaiveDateTime = "2024-05-01T08:00:00".parse().unwrap();
        let cases = [
            (
                CoreError::ScheduledFlightAlreadyExists {
                    flight_number: "F1".to_string(),
                    departure,
                },
                CreateScheduledFlightError::ScheduledFlightAlreadyExists,
            ),
            (
                CoreError::AirplaneAlreadyScheduled {
                    airplane_id: "YR-ABC".to_string(),
                    departure,
                },
                CreateScheduledFlightError::AirplaneAlreadyScheduled,
            ),
            (
                CoreError::ArrivalBeforeDeparture {
                    departure,
                    arrival: departure,
                },
                CreateScheduledFlightError::ArrivalBeforeDeparture,
            ),
        ];

        for (fault, expected) in cases {
            let response = CreateScheduledFlightHandler::handle(
                &schedule("F1", "YR-ABC", "2024-05-01T08:00:00", "2024-05-01T10:00:00"),
                &FailingService(fault),
                &mapper,
            );
            assert!(!response.success);
            assert_eq!(response.error, Some(expected));
            assert_eq!(response.flight_number, "F1");
            assert_eq!(response.departure, "2024-05-01T08:00:00");
        }
    }

    #[test]
    fn test_already_exists_wins_over_airplane_conflict() {
        let service = seeded();
        let mapper = WireMapper::new();
        let command = schedule("F123", "YR-ABC", "2024-05-01T08:00:00", "2024-05-01T10:00:00");

        let first = CreateScheduledFlightHandler::handle(&command, &service, &mapper);
        assert!(first.success);

        // Same key, and the airplane is busy over the same window
        for _ in 0..3 {
            let again = CreateScheduledFlightHandler::handle(&command, &service, &mapper);
            assert_eq!(
                again.error,
                Some(CreateScheduledFlightError::ScheduledFlightAlreadyExists)
            );
        }

        let overlap = CreateScheduledFlightHandler::handle(
            &schedule("F456", "YR-ABC", "2024-05-01T09:00:00", "2024-05-01T11:00:00"),
            &service,
            &mapper,
        );
        assert_eq!(
            overlap.error,
            Some(CreateScheduledFlightError::AirplaneAlreadyScheduled)
        );

        let inverted = CreateScheduledFlightHandler::handle(
            &schedule("F456", "YR-ABC", "2024-05-02T11:00:00", "2024-05-02T09:00:00"),
            &service,
            &mapper,
        );
        assert_eq!(
            inverted.error,
            Some(CreateScheduledFlightError::ArrivalBeforeDeparture)
        );
    }

    #[test]
    fn test_unparsable_dates() {
        let service = seeded();
        let mapper = WireMapper::new();

        let response = CreateScheduledFlightHandler::handle(
            &schedule("F123", "YR-ABC", "next tuesday", "2024-05-01T10:00:00"),
            &service,
            &mapper,
        );
        assert_eq!(response.error, Some(CreateScheduledFlightError::InternalError));

        let response = FindScheduledFlightHandler::handle(
            &FindScheduledFlightCommand {
                flight_number: "F123".to_string(),
                departure: "garbage".to_string(),
            },
            &service,
            &mapper,
        );
        assert_eq!(response, FindScheduledFlightResponse::not_found());
    }

    #[test]
    fn test_create_booking() {
        let service = seeded();
        let mapper = WireMapper::new();
        CreateScheduledFlightHandler::handle(
            &schedule("F123", "YR-ABC", "2024-05-01T08:00:00", "2024-05-01T10:00:00"),
            &service,
            &mapper,
        );

        let command = CreateBookingCommand {
            flight_number: "F123".to_string(),
            departure: "2024-05-01T08:00:00".to_string(),
            seat: SeatData {
                row: 12,
                letter: 'C',
            },
            passenger: PassengerData {
                first_name: "Ana".to_string(),
                last_name: "Pop".to_string(),
            },
        };

        let response = CreateBookingHandler::handle(&command, &service, &mapper);
        assert!(response.success);
        assert_eq!(response.seat, command.seat);

        // Seat taken is not part of the booking vocabulary
        let response = CreateBookingHandler::handle(&command, &service, &mapper);
        assert!(!response.success);
        assert_eq!(response.error, Some(CreateBookingError::InternalError));
    }

    #[test]
    fn test_find_and_get() {
        let service = seeded();
        let mapper = WireMapper::new();

        let response = FindFlightHandler::handle(
            &FindFlightCommand {
                number: "F123".to_string(),
            },
            &service,
            &mapper,
        );
        assert!(response.found);
        assert_eq!(response.flight.unwrap().company, "Tarom");

        let response = FindFlightHandler::handle(
            &FindFlightCommand {
                number: "F999".to_string(),
            },
            &service,
            &mapper,
        );
        assert_eq!(response, FindFlightResponse::not_found());

        let response = FindAirplaneHandler::handle(
            &FindAirplaneCommand {
                id: "YR-ABC".to_string(),
            },
            &service,
            &mapper,
        );
        assert_eq!(response.airplane.unwrap().seats_per_row, 6);

        let response = GetFlightsHandler::handle(&GetFlightsCommand {}, &service, &mapper);
        let numbers: Vec<_> = response.flights.iter().map(|f| f.number.as_str()).collect();
        assert_eq!(numbers, vec!["F123", "F456"]);

        let response = GetAirplanesHandler::handle(&GetAirplanesCommand {}, &service, &mapper);
        assert_eq!(response.airplanes.len(), 1);

        let response =
            GetScheduledFlightsHandler::handle(&GetScheduledFlightsCommand {}, &service, &mapper);
        assert!(response.scheduled_flights.is_empty());
    }

    #[test]
    fn test_find_scheduled_flight() {
        let service = seeded();
        let mapper = WireMapper::new();
        CreateScheduledFlightHandler::handle(
            &schedule("F123", "YR-ABC", "2024-05-01T08:00:00", "2024-05-01T10:00:00"),
            &service,
            &mapper,
        );

        let response = FindScheduledFlightHandler::handle(
            &FindScheduledFlightCommand {
                flight_number: "F123".to_string(),
                departure: "2024-05-01T08:00:00".to_string(),
            },
            &service,
            &mapper,
        );
        let found = response.scheduled_flight.unwrap();
        assert_eq!(found.airplane_id, "YR-ABC");
        assert_eq!(found.arrival, "2024-05-01T10:00:00");
    }
}
