//! Command execution.

use crate::Commands;
use colored::Colorize;
use skybook_client::{Client, ClientError};
use skybook_core::{Airplane, Booking, Flight, Passenger, ScheduledFlight, Seat};
use skybook_protocol::DATE_TIME_FORMAT;

/// Executes a command and returns the formatted output.
pub async fn execute(client: &Client, cmd: Commands) -> Result<String, ClientError> {
    match cmd {
        Commands::CreateFlight { number, company } => {
            client
                .create_flight(&Flight::new(number.clone(), company.clone()))
                .await?;
            Ok(format!(
                "{} flight {} ({})",
                "Created".green(),
                number.cyan(),
                company
            ))
        }

        Commands::CreateAirplane {
            id,
            model,
            rows,
            seats_per_row,
        } => {
            let airplane = Airplane::new(id, model, rows, seats_per_row);
            client.create_airplane(&airplane).await?;
            Ok(format!(
                "{} airplane {} ({}, {} seats)",
                "Created".green(),
                airplane.id.cyan(),
                airplane.model,
                airplane.capacity()
            ))
        }

        Commands::ScheduleFlight {
            flight_number,
            airplane,
            departure,
            arrival,
        } => {
            let scheduled = ScheduledFlight::new(flight_number, airplane, departure, arrival);
            client.create_scheduled_flight(&scheduled).await?;
            Ok(format!(
                "{} flight {}\n{}",
                "Scheduled".green(),
                scheduled.flight_number.cyan(),
                format_scheduled_flight(&scheduled)
            ))
        }

        Commands::Book {
            flight_number,
            departure,
            seat: (row, letter),
            first_name,
            last_name,
        } => {
            let booking = Booking::new(
                flight_number,
                departure,
                Seat::new(row, letter),
                Passenger::new(first_name, last_name),
            );
            client.create_booking(&booking).await?;
            Ok(format!(
                "{} seat {} on {} departing {} for {} {}",
                "Booked".green(),
                booking.seat.to_string().yellow(),
                booking.flight_number.cyan(),
                booking.departure.format(DATE_TIME_FORMAT),
                booking.passenger.first_name,
                booking.passenger.last_name
            ))
        }

        Commands::FindFlight { number } => {
            let flight = client.find_flight(&number).await?;
            Ok(format!(
                "{}\n  Company: {}",
                format!("Flight {}", flight.number.cyan()).bold(),
                flight.company
            ))
        }

        Commands::FindAirplane { id } => {
            let airplane = client.find_airplane(&id).await?;
            Ok(format!(
                "{}\n  Model: {}\n  Seats: {} rows x {} ({} total)",
                format!("Airplane {}", airplane.id.cyan()).bold(),
                airplane.model,
                airplane.rows,
                airplane.seats_per_row,
                airplane.capacity()
            ))
        }

        Commands::FindScheduledFlight {
            flight_number,
            departure,
        } => {
            let scheduled = client
                .find_scheduled_flight(&flight_number, departure)
                .await?;
            Ok(format!(
                "{}\n{}",
                format!("Scheduled flight {}", scheduled.flight_number.cyan()).bold(),
                format_scheduled_flight(&scheduled)
            ))
        }

        Commands::Flights => {
            let flights = client.get_flights().await?;
            if flights.is_empty() {
                return Ok("No flights registered".yellow().to_string());
            }
            Ok(flights
                .iter()
                .map(|f| format!("  {} ({})", f.number.cyan(), f.company))
                .collect::<Vec<_>>()
                .join("\n"))
        }

        Commands::Airplanes => {
            let airplanes = client.get_airplanes().await?;
            if airplanes.is_empty() {
                return Ok("No airplanes registered".yellow().to_string());
            }
            Ok(airplanes
                .iter()
                .map(|a| format!("  {} {} [{} seats]", a.id.cyan(), a.model, a.capacity()))
                .collect::<Vec<_>>()
                .join("\n"))
        }

        Commands::ScheduledFlights => {
            let scheduled = client.get_scheduled_flights().await?;
            if scheduled.is_empty() {
                return Ok("No flights scheduled".yellow().to_string());
            }
            Ok(scheduled
                .iter()
                .map(|s| {
                    format!(
                        "  {} on {}: {} -> {}",
                        s.flight_number.cyan(),
                        s.airplane_id,
                        s.departure.format(DATE_TIME_FORMAT),
                        s.arrival.format(DATE_TIME_FORMAT)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

fn format_scheduled_flight(scheduled: &ScheduledFlight) -> String {
    format!(
        "  Airplane: {}\n  Departure: {}\n  Arrival: {}",
        scheduled.airplane_id,
        scheduled.departure.format(DATE_TIME_FORMAT),
        scheduled.arrival.format(DATE_TIME_FORMAT).to_string().yellow()
    )
}
