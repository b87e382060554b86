//! Conversion between wire value objects and domain entities.

use crate::error::MappingError;
use crate::message::{AirplaneData, FlightData, PassengerData, ScheduledFlightData, SeatData};
use crate::DATE_TIME_FORMAT;
use chrono::NaiveDateTime;
use skybook_core::{Airplane, Flight, Passenger, ScheduledFlight, Seat};

/// Bidirectional mapping between domain entities and wire value objects.
///
/// Conversions are lossless for every field the wire types carry. Only
/// date-time fields can fail, since they travel as text.
pub trait DomainMapper: Send + Sync {
    fn flight_to_wire(&self, flight: &Flight) -> FlightData;

    fn flight_from_wire(&self, data: &FlightData) -> Flight;

    fn airplane_to_wire(&self, airplane: &Airplane) -> AirplaneData;

    fn airplane_from_wire(&self, data: &AirplaneData) -> Airplane;

    fn scheduled_flight_to_wire(&self, scheduled: &ScheduledFlight) -> ScheduledFlightData;

    fn scheduled_flight_from_wire(
        &self,
        data: &ScheduledFlightData,
    ) -> Result<ScheduledFlight, MappingError>;

    fn seat_to_wire(&self, seat: &Seat) -> SeatData;

    fn seat_from_wire(&self, data: &SeatData) -> Seat;

    fn passenger_to_wire(&self, passenger: &Passenger) -> PassengerData;

    fn passenger_from_wire(&self, data: &PassengerData) -> Passenger;

    fn format_date_time(&self, value: NaiveDateTime) -> String;

    /// Parses a wire date-time; `field` names the offending field on failure.
    fn parse_date_time(&self, field: &'static str, value: &str)
        -> Result<NaiveDateTime, MappingError>;
}

/// The standard mapper, using [`DATE_TIME_FORMAT`] for dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireMapper;

impl WireMapper {
    pub fn new() -> Self {
        Self
    }
}

impl DomainMapper for WireMapper {
    fn flight_to_wire(&self, flight: &Flight) -> FlightData {
        FlightData {
            number: flight.number.clone(),
            company: flight.company.clone(),
        }
    }

    fn flight_from_wire(&self, data: &FlightData) -> Flight {
        Flight::new(data.number.clone(), data.company.clone())
    }

    fn airplane_to_wire(&self, airplane: &Airplane) -> AirplaneData {
        AirplaneData {
            id: airplane.id.clone(),
            model: airplane.model.clone(),
            rows: airplane.rows,
            seats_per_row: airplane.seats_per_row,
        }
    }

    fn airplane_from_wire(&self, data: &AirplaneData) -> Airplane {
        Airplane::new(
            data.id.clone(),
            data.model.clone(),
            data.rows,
            data.seats_per_row,
        )
    }

    fn scheduled_flight_to_wire(&self, scheduled: &ScheduledFlight) -> ScheduledFlightData {
        ScheduledFlightData {
            flight_number: scheduled.flight_number.clone(),
            airplane_id: scheduled.airplane_id.clone(),
            departure: self.format_date_time(scheduled.departure),
            arrival: self.format_date_time(scheduled.arrival),
        }
    }

    fn scheduled_flight_from_wire(
        &self,
        data: &ScheduledFlightData,
    ) -> Result<ScheduledFlight, MappingError> {
        Ok(ScheduledFlight::new(
            data.flight_number.clone(),
            data.airplane_id.clone(),
            self.parse_date_time("departure", &data.departure)?,
            self.parse_date_time("arrival", &data.arrival)?,
        ))
    }

    fn seat_to_wire(&self, seat: &Seat) -> SeatData {
        SeatData {
            row: seat.row,
            letter: seat.letter,
        }
    }

    fn seat_from_wire(&self, data: &SeatData) -> Seat {
        Seat::new(data.row, data.letter)
    }

    fn passenger_to_wire(&self, passenger: &Passenger) -> PassengerData {
        PassengerData {
            first_name: passenger.first_name.clone(),
            last_name: passenger.last_name.clone(),
        }
    }

    fn passenger_from_wire(&self, data: &PassengerData) -> Passenger {
        Passenger::new(data.first_name.clone(), data.last_name.clone())
    }

    fn format_date_time(&self, value: NaiveDateTime) -> String {
        value.format(DATE_TIME_FORMAT).to_string()
    }

    fn parse_date_time(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<NaiveDateTime, MappingError> {
        NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).map_err(|_| {
            MappingError::InvalidDateTime {
                field,
                value: value.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_date_time_format() {
        let mapper = WireMapper::new();
        let value = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();

        assert_eq!(mapper.format_date_time(value), "2024-05-01T08:30:00");
        assert_eq!(
            mapper
                .parse_date_time("departure", "2024-05-01T08:30:00")
                .unwrap(),
            value
        );
    }

    #[test]
    fn test_invalid_date_time() {
        let mapper = WireMapper::new();
        let err = mapper
            .parse_date_time("arrival", "2024-05-01 08:30")
            .unwrap_err();
        assert_eq!(
            err,
            MappingError::InvalidDateTime {
                field: "arrival",
                value: "2024-05-01 08:30".to_string(),
            }
        );
    }

    #[test]
    fn test_scheduled_flight_mapping() {
        let mapper = WireMapper::new();
        let data = ScheduledFlightData {
            flight_number: "F123".to_string(),
            airplane_id: "YR-ABC".to_string(),
            departure: "2024-05-01T08:00:00".to_string(),
            arrival: "2024-05-01T10:15:00".to_string(),
        };

        let scheduled = mapper.scheduled_flight_from_wire(&data).unwrap();
        assert_eq!(scheduled.flight_number, "F123");
        assert_eq!(mapper.scheduled_flight_to_wire(&scheduled), data);

        let bad = ScheduledFlightData {
            departure: "tomorrow".to_string(),
            ..data
        };
        assert!(matches!(
            mapper.scheduled_flight_from_wire(&bad),
            Err(MappingError::InvalidDateTime {
                field: "departure",
                ..
            })
        ));
    }

    #[test]
    fn test_entity_mapping() {
        let mapper = WireMapper::new();

        let flight = Flight::new("F123", "Tarom");
        assert_eq!(mapper.flight_from_wire(&mapper.flight_to_wire(&flight)), flight);

        let airplane = Airplane::new("YR-ABC", "A320", 30, 6);
        assert_eq!(
            mapper.airplane_from_wire(&mapper.airplane_to_wire(&airplane)),
            airplane
        );

        let seat = Seat::new(12, 'C');
        assert_eq!(mapper.seat_from_wire(&mapper.seat_to_wire(&seat)), seat);

        let passenger = Passenger::new("Ana", "Pop");
        assert_eq!(
            mapper.passenger_from_wire(&mapper.passenger_to_wire(&passenger)),
            passenger
        );
    }
}
