//! Domain entities.

use chrono::NaiveDateTime;
use std::fmt;

/// A flight route operated by a company, identified by its flight number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Flight {
    pub number: String,
    pub company: String,
}

impl Flight {
    pub fn new(number: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            company: company.into(),
        }
    }
}

/// An airplane with a rectangular seat grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Airplane {
    pub id: String,
    pub model: String,
    pub rows: u32,
    pub seats_per_row: u32,
}

impl Airplane {
    pub fn new(id: impl Into<String>, model: impl Into<String>, rows: u32, seats_per_row: u32) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            rows,
            seats_per_row,
        }
    }

    /// Returns whether the seat exists on this airplane.
    ///
    /// Rows are numbered from 1 and seat letters start at `A`.
    pub fn has_seat(&self, seat: &Seat) -> bool {
        if seat.row == 0 || seat.row > self.rows {
            return false;
        }
        let letter = seat.normalized().letter;
        if !letter.is_ascii_uppercase() {
            return false;
        }
        u32::from(letter as u8 - b'A') < self.seats_per_row
    }

    /// Total number of seats.
    pub fn capacity(&self) -> u64 {
        u64::from(self.rows) * u64::from(self.seats_per_row)
    }
}

/// A flight assigned to an airplane for a concrete time window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduledFlight {
    pub flight_number: String,
    pub airplane_id: String,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
}

impl ScheduledFlight {
    pub fn new(
        flight_number: impl Into<String>,
        airplane_id: impl Into<String>,
        departure: NaiveDateTime,
        arrival: NaiveDateTime,
    ) -> Self {
        Self {
            flight_number: flight_number.into(),
            airplane_id: airplane_id.into(),
            departure,
            arrival,
        }
    }

    /// Natural key: a flight number departs at most once at a given time.
    pub fn key(&self) -> (String, NaiveDateTime) {
        (self.flight_number.clone(), self.departure)
    }

    /// Returns whether both schedules occupy the same airplane at the same time.
    ///
    /// Windows are half-open, so a flight may depart the instant the previous one arrives.
    pub fn overlaps(&self, other: &ScheduledFlight) -> bool {
        self.airplane_id == other.airplane_id
            && self.departure < other.arrival
            && other.departure < self.arrival
    }
}

/// A seat position, e.g. `12C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Seat {
    pub row: u32,
    pub letter: char,
}

impl Seat {
    pub fn new(row: u32, letter: char) -> Self {
        Self { row, letter }
    }

    /// The same seat with an upper-case letter. `12c` and `12C` name one seat.
    pub fn normalized(self) -> Self {
        Self {
            row: self.row,
            letter: self.letter.to_ascii_uppercase(),
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.letter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Passenger {
    pub first_name: String,
    pub last_name: String,
}

impl Passenger {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// A passenger holding a seat on a scheduled flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Booking {
    pub flight_number: String,
    pub departure: NaiveDateTime,
    pub seat: Seat,
    pub passenger: Passenger,
}

impl Booking {
    pub fn new(
        flight_number: impl Into<String>,
        departure: NaiveDateTime,
        seat: Seat,
        passenger: Passenger,
    ) -> Self {
        Self {
            flight_number: flight_number.into(),
            departure,
            seat,
            passenger,
        }
    }
}
