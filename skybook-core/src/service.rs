//! The flight management service contract.

use crate::error::CoreError;
use crate::model::{Airplane, Booking, Flight, ScheduledFlight};
use chrono::NaiveDateTime;

/// Business operations exposed over every transport.
///
/// Implementations must be safe to call from many connections at once.
/// Lookups return `None` for absent entities; listings are returned in a
/// stable order (flights by number, airplanes by id, scheduled flights by
/// departure then flight number).
pub trait FlightManagementService: Send + Sync {
    fn create_flight(&self, flight: Flight) -> Result<(), CoreError>;

    fn create_airplane(&self, airplane: Airplane) -> Result<(), CoreError>;

    /// Schedules a flight on an airplane.
    ///
    /// When several rules are violated at once, the reported error is the first
    /// of: `ScheduledFlightAlreadyExists`, `AirplaneAlreadyScheduled`,
    /// `ArrivalBeforeDeparture`.
    fn create_scheduled_flight(&self, scheduled: ScheduledFlight) -> Result<(), CoreError>;

    fn create_booking(&self, booking: Booking) -> Result<(), CoreError>;

    fn find_flight(&self, number: &str) -> Option<Flight>;

    fn find_airplane(&self, id: &str) -> Option<Airplane>;

    fn find_scheduled_flight(
        &self,
        flight_number: &str,
        departure: NaiveDateTime,
    ) -> Option<ScheduledFlight>;

    fn get_flights(&self) -> Vec<Flight>;

    fn get_airplanes(&self) -> Vec<Airplane>;

    fn get_scheduled_flights(&self) -> Vec<ScheduledFlight>;
}
