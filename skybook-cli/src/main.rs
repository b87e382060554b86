//! skybook-cli - Command-line interface for skybook
//!
//! Runs one command against a skybook server and prints the result.

mod commands;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use colored::Colorize;
use skybook_client::{Client, ClientError, ConnectionConfig};
use skybook_protocol::DATE_TIME_FORMAT;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skybook-cli")]
#[command(about = "Command-line interface for the skybook flight management server")]
#[command(version)]
struct Cli {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7420", env = "SKYBOOK_SERVER")]
    server: SocketAddr,

    /// Connect timeout in seconds
    #[arg(long, default_value = "10")]
    connect_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Register a flight
    CreateFlight {
        /// Flight number
        number: String,

        /// Operating company
        #[arg(short, long)]
        company: String,
    },

    /// Register an airplane
    CreateAirplane {
        /// Airplane id (registration)
        id: String,

        /// Airplane model
        #[arg(short, long)]
        model: String,

        /// Number of seat rows
        #[arg(short, long)]
        rows: u32,

        /// Seats in each row
        #[arg(short = 'p', long)]
        seats_per_row: u32,
    },

    /// Schedule a flight on an airplane
    ScheduleFlight {
        /// Flight number
        flight_number: String,

        /// Airplane id
        #[arg(short, long)]
        airplane: String,

        /// Departure, e.g. 2024-05-01T08:00:00
        #[arg(short, long, value_parser = parse_date_time)]
        departure: NaiveDateTime,

        /// Arrival, e.g. 2024-05-01T10:30:00
        #[arg(long, value_parser = parse_date_time)]
        arrival: NaiveDateTime,
    },

    /// Book a seat on a scheduled flight
    Book {
        /// Flight number
        flight_number: String,

        /// Departure of the scheduled flight
        #[arg(short, long, value_parser = parse_date_time)]
        departure: NaiveDateTime,

        /// Seat, e.g. 12C
        #[arg(short, long, value_parser = parse_seat)]
        seat: (u32, char),

        /// Passenger first name
        #[arg(long)]
        first_name: String,

        /// Passenger last name
        #[arg(long)]
        last_name: String,
    },

    /// Look up a flight
    FindFlight {
        /// Flight number
        number: String,
    },

    /// Look up an airplane
    FindAirplane {
        /// Airplane id
        id: String,
    },

    /// Look up a scheduled flight
    FindScheduledFlight {
        /// Flight number
        flight_number: String,

        /// Departure
        #[arg(short, long, value_parser = parse_date_time)]
        departure: NaiveDateTime,
    },

    /// List all flights
    Flights,

    /// List all airplanes
    Airplanes,

    /// List all scheduled flights
    ScheduledFlights,
}

fn parse_date_time(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .map_err(|e| format!("expected {}: {}", DATE_TIME_FORMAT, e))
}

/// Parses a seat such as `12C` into its row and letter.
fn parse_seat(value: &str) -> Result<(u32, char), String> {
    let letter = value
        .chars()
        .last()
        .filter(|c| c.is_ascii_alphabetic())
        .ok_or_else(|| format!("seat must end with a letter: {:?}", value))?;
    let row = value[..value.len() - 1]
        .parse::<u32>()
        .map_err(|_| format!("seat must start with a row number: {:?}", value))?;
    Ok((row, letter.to_ascii_uppercase()))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = ConnectionConfig::new(cli.server)
        .with_connect_timeout(Duration::from_secs(cli.connect_timeout));
    let client = Client::new(config);

    if let Err(e) = client.connect().await {
        eprintln!("{}: {}", "Connection failed".red(), e);
        std::process::exit(1);
    }

    let result = commands::execute(&client, cli.command).await;
    let _ = client.close().await;

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}: {}", failure_label(&e).red(), e);
            std::process::exit(1);
        }
    }
}

/// Names the kind of failure for the error line.
fn failure_label(err: &ClientError) -> &'static str {
    if err.is_domain() {
        "Rejected"
    } else if err.is_transport() {
        "Connection error"
    } else {
        "Error"
    }
}
