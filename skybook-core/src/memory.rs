//! In-memory flight management service.

use crate::error::CoreError;
use crate::model::{Airplane, Booking, Flight, ScheduledFlight, Seat};
use crate::service::FlightManagementService;
use chrono::NaiveDateTime;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

type ScheduleKey = (String, NaiveDateTime);

/// Scheduled flights and their bookings, guarded together so that overlap
/// and seat checks happen atomically with the insert.
#[derive(Default)]
struct Schedule {
    flights: BTreeMap<ScheduleKey, ScheduledFlight>,
    bookings: HashMap<ScheduleKey, BTreeMap<Seat, Booking>>,
}

/// Thread-safe, process-local implementation of [`FlightManagementService`].
#[derive(Default)]
pub struct InMemoryFlightService {
    flights: DashMap<String, Flight>,
    airplanes: DashMap<String, Airplane>,
    schedule: RwLock<Schedule>,
}

impl InMemoryFlightService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bookings of one scheduled flight, ordered by seat.
    pub fn bookings(&self, flight_number: &str, departure: NaiveDateTime) -> Vec<Booking> {
        let schedule = self.schedule.read();
        schedule
            .bookings
            .get(&(flight_number.to_string(), departure))
            .map(|seats| seats.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl FlightManagementService for InMemoryFlightService {
    fn create_flight(&self, flight: Flight) -> Result<(), CoreError> {
        match self.flights.entry(flight.number.clone()) {
            Entry::Occupied(_) => Err(CoreError::FlightAlreadyExists {
                number: flight.number,
            }),
            Entry::Vacant(slot) => {
                tracing::debug!("Created flight {}", flight.number);
                slot.insert(flight);
                Ok(())
            }
        }
    }

    fn create_airplane(&self, airplane: Airplane) -> Result<(), CoreError> {
        match self.airplanes.entry(airplane.id.clone()) {
            Entry::Occupied(_) => Err(CoreError::AirplaneAlreadyExists { id: airplane.id }),
            Entry::Vacant(slot) => {
                tracing::debug!("Created airplane {}", airplane.id);
                slot.insert(airplane);
                Ok(())
            }
        }
    }

    fn create_scheduled_flight(&self, scheduled: ScheduledFlight) -> Result<(), CoreError> {
        let mut schedule = self.schedule.write();
        let key = scheduled.key();

        if schedule.flights.contains_key(&key) {
            return Err(CoreError::ScheduledFlightAlreadyExists {
                flight_number: scheduled.flight_number,
                departure: scheduled.departure,
            });
        }

        if schedule
            .flights
            .values()
            .any(|existing| existing.overlaps(&scheduled))
        {
            return Err(CoreError::AirplaneAlreadyScheduled {
                airplane_id: scheduled.airplane_id,
                departure: scheduled.departure,
            });
        }

        if scheduled.arrival <= scheduled.departure {
            return Err(CoreError::ArrivalBeforeDeparture {
                departure: scheduled.departure,
                arrival: scheduled.arrival,
            });
        }

        if !self.flights.contains_key(&scheduled.flight_number) {
            return Err(CoreError::FlightNotFound {
                number: scheduled.flight_number,
            });
        }

        if !self.airplanes.contains_key(&scheduled.airplane_id) {
            return Err(CoreError::AirplaneNotFound {
                id: scheduled.airplane_id,
            });
        }

        tracing::debug!(
            "Scheduled flight {} on {} departing {}",
            scheduled.flight_number,
            scheduled.airplane_id,
            scheduled.departure
        );
        schedule.flights.insert(key, scheduled);
        Ok(())
    }

    fn create_booking(&self, mut booking: Booking) -> Result<(), CoreError> {
        booking.seat = booking.seat.normalized();
        let mut schedule = self.schedule.write();
        let key = (booking.flight_number.clone(), booking.departure);

        let airplane_id = match schedule.flights.get(&key) {
            Some(scheduled) => scheduled.airplane_id.clone(),
            None => {
                return Err(CoreError::ScheduledFlightNotFound {
                    flight_number: booking.flight_number,
                    departure: booking.departure,
                })
            }
        };

        let seat_exists = self
            .airplanes
            .get(&airplane_id)
            .map(|airplane| airplane.has_seat(&booking.seat))
            .unwrap_or(false);
        if !seat_exists {
            return Err(CoreError::SeatOutOfRange {
                airplane_id,
                seat: booking.seat.to_string(),
            });
        }

        let seats = schedule.bookings.entry(key).or_default();
        if seats.contains_key(&booking.seat) {
            return Err(CoreError::SeatAlreadyBooked {
                flight_number: booking.flight_number,
                seat: booking.seat.to_string(),
            });
        }

        tracing::debug!(
            "Booked seat {} on {} for {} {}",
            booking.seat,
            booking.flight_number,
            booking.passenger.first_name,
            booking.passenger.last_name
        );
        seats.insert(booking.seat, booking);
        Ok(())
    }

    fn find_flight(&self, number: &str) -> Option<Flight> {
        self.flights.get(number).map(|entry| entry.value().clone())
    }

    fn find_airplane(&self, id: &str) -> Option<Airplane> {
        self.airplanes.get(id).map(|entry| entry.value().clone())
    }

    fn find_scheduled_flight(
        &self,
        flight_number: &str,
        departure: NaiveDateTime,
    ) -> Option<ScheduledFlight> {
        self.schedule
            .read()
            .flights
            .get(&(flight_number.to_string(), departure))
            .cloned()
    }

    fn get_flights(&self) -> Vec<Flight> {
        let mut flights: Vec<Flight> = self
            .flights
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        flights.sort_by(|a, b| a.number.cmp(&b.number));
        flights
    }

    fn get_airplanes(&self) -> Vec<Airplane> {
        let mut airplanes: Vec<Airplane> = self
            .airplanes
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        airplanes.sort_by(|a, b| a.id.cmp(&b.id));
        airplanes
    }

    fn get_scheduled_flights(&self) -> Vec<ScheduledFlight> {
        let mut scheduled: Vec<ScheduledFlight> =
            self.schedule.read().flights.values().cloned().collect();
        scheduled.sort_by(|a, b| {
            a.departure
                .cmp(&b.departure)
                .then_with(|| a.flight_number.cmp(&b.flight_number))
        });
        scheduled
    }
}
