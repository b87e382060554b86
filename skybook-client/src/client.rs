//! High-level client API.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::ClientError;
use chrono::NaiveDateTime;
use skybook_core::{Airplane, Booking, CoreError, Flight, ScheduledFlight};
use skybook_protocol::message::*;
use skybook_protocol::{
    CreateAirplaneError, CreateBookingError, CreateFlightError, CreateScheduledFlightError,
    DomainMapper, WireMapper,
};
use std::sync::Arc;

/// Remote flight management service.
///
/// Every operation is one command/response exchange on a shared connection.
/// Error codes from create responses are turned back into [`CoreError`]s,
/// except `InternalError` and a missing code, which become
/// [`ClientError::Server`].
pub struct Client {
    conn: Arc<Connection>,
    mapper: Arc<dyn DomainMapper>,
}

impl Client {
    /// Creates a new client with the given configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_mapper(config, Arc::new(WireMapper::new()))
    }

    pub fn with_mapper(config: ConnectionConfig, mapper: Arc<dyn DomainMapper>) -> Self {
        Self {
            conn: Arc::new(Connection::new(config)),
            mapper,
        }
    }

    /// Connects to the server.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.conn.connect().await
    }

    /// Returns whether the client is connected.
    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    /// Closes the connection.
    pub async fn close(&self) -> Result<(), ClientError> {
        self.conn.close().await
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> Arc<Connection> {
        self.conn.clone()
    }

    // =========================================================================
    // Create operations
    // =========================================================================

    pub async fn create_flight(&self, flight: &Flight) -> Result<(), ClientError> {
        let command = CreateFlightCommand {
            number: flight.number.clone(),
            company: flight.company.clone(),
        };
        let response = self.conn.send_command(command).await?;
        if response.success {
            return Ok(());
        }

        Err(match response.error {
            Some(CreateFlightError::FlightAlreadyExists) => CoreError::FlightAlreadyExists {
                number: flight.number.clone(),
            }
            .into(),
            other => server_error(other.map(|code| code.as_str())),
        })
    }

    pub async fn create_airplane(&self, airplane: &Airplane) -> Result<(), ClientError> {
        let data = self.mapper.airplane_to_wire(airplane);
        let command = CreateAirplaneCommand {
            id: data.id,
            model: data.model,
            rows: data.rows,
            seats_per_row: data.seats_per_row,
        };
        let response = self.conn.send_command(command).await?;
        if response.success {
            return Ok(());
        }

        Err(match response.error {
            Some(CreateAirplaneError::AirplaneAlreadyExists) => CoreError::AirplaneAlreadyExists {
                id: airplane.id.clone(),
            }
            .into(),
            other => server_error(other.map(|code| code.as_str())),
        })
    }

    pub async fn create_scheduled_flight(
        &self,
        scheduled: &ScheduledFlight,
    ) -> Result<(), ClientError> {
        let data = self.mapper.scheduled_flight_to_wire(scheduled);
        let command = CreateScheduledFlightCommand {
            flight_number: data.flight_number,
            airplane_id: data.airplane_id,
            departure: data.departure,
            arrival: data.arrival,
        };
        let response = self.conn.send_command(command).await?;
        if response.success {
            return Ok(());
        }

        let err = match response.error {
            Some(CreateScheduledFlightError::ScheduledFlightAlreadyExists) => {
                CoreError::ScheduledFlightAlreadyExists {
                    flight_number: scheduled.flight_number.clone(),
                    departure: scheduled.departure,
                }
            }
            Some(CreateScheduledFlightError::AirplaneAlreadyScheduled) => {
                CoreError::AirplaneAlreadyScheduled {
                    airplane_id: scheduled.airplane_id.clone(),
                    departure: scheduled.departure,
                }
            }
            Some(CreateScheduledFlightError::ArrivalBeforeDeparture) => {
                CoreError::ArrivalBeforeDeparture {
                    departure: scheduled.departure,
                    arrival: scheduled.arrival,
                }
            }
            other => return Err(server_error(other.map(|code| code.as_str()))),
        };
        Err(err.into())
    }

    pub async fn create_booking(&self, booking: &Booking) -> Result<(), ClientError> {
        let command = CreateBookingCommand {
            flight_number: booking.flight_number.clone(),
            departure: self.mapper.format_date_time(booking.departure),
            seat: self.mapper.seat_to_wire(&booking.seat),
            passenger: self.mapper.passenger_to_wire(&booking.passenger),
        };
        let response = self.conn.send_command(command).await?;
        if response.success {
            return Ok(());
        }

        // InternalError is the whole booking vocabulary
        let code: Option<CreateBookingError> = response.error;
        Err(server_error(code.map(|code| code.as_str())))
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Fetches a flight by number.
    ///
    /// An unknown flight is reported as [`ClientError::NotFound`].
    pub async fn find_flight(&self, number: &str) -> Result<Flight, ClientError> {
        let command = FindFlightCommand {
            number: number.to_string(),
        };
        let response = self.conn.send_command(command).await?;
        match response.flight {
            Some(data) if response.found => Ok(self.mapper.flight_from_wire(&data)),
            _ => Err(ClientError::NotFound(format!("flight {}", number))),
        }
    }

    pub async fn find_airplane(&self, id: &str) -> Result<Airplane, ClientError> {
        let command = FindAirplaneCommand { id: id.to_string() };
        let response = self.conn.send_command(command).await?;
        match response.airplane {
            Some(data) if response.found => Ok(self.mapper.airplane_from_wire(&data)),
            _ => Err(ClientError::NotFound(format!("airplane {}", id))),
        }
    }

    pub async fn find_scheduled_flight(
        &self,
        flight_number: &str,
        departure: NaiveDateTime,
    ) -> Result<ScheduledFlight, ClientError> {
        let departure = self.mapper.format_date_time(departure);
        let command = FindScheduledFlightCommand {
            flight_number: flight_number.to_string(),
            departure: departure.clone(),
        };
        let response = self.conn.send_command(command).await?;
        match response.scheduled_flight {
            Some(data) if response.found => Ok(self.mapper.scheduled_flight_from_wire(&data)?),
            _ => Err(ClientError::NotFound(format!(
                "scheduled flight {} departing {}",
                flight_number, departure
            ))),
        }
    }

    // =========================================================================
    // Listings
    // =========================================================================

    pub async fn get_flights(&self) -> Result<Vec<Flight>, ClientError> {
        let response = self.conn.send_command(GetFlightsCommand {}).await?;
        Ok(response
            .flights
            .iter()
            .map(|data| self.mapper.flight_from_wire(data))
            .collect())
    }

    pub async fn get_airplanes(&self) -> Result<Vec<Airplane>, ClientError> {
        let response = self.conn.send_command(GetAirplanesCommand {}).await?;
        Ok(response
            .airplanes
            .iter()
            .map(|data| self.mapper.airplane_from_wire(data))
            .collect())
    }

    pub async fn get_scheduled_flights(&self) -> Result<Vec<ScheduledFlight>, ClientError> {
        let response = self.conn.send_command(GetScheduledFlightsCommand {}).await?;
        response
            .scheduled_flights
            .iter()
            .map(|data| Ok(self.mapper.scheduled_flight_from_wire(data)?))
            .collect()
    }
}

fn server_error(label: Option<&'static str>) -> ClientError {
    tracing::debug!("Server reported failure: {}", label.unwrap_or("no error code"));
    ClientError::Server(label)
}
