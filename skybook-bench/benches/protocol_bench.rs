//! Line codec and dispatch benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use skybook_core::{Flight, FlightManagementService, InMemoryFlightService};
use skybook_protocol::message::*;
use skybook_protocol::{Decoder, Encoder, Message, WireMapper};
use skybook_server::HandlerRegistry;

fn create_booking_command() -> Message {
    CreateBookingCommand {
        flight_number: "F123".to_string(),
        departure: "2024-05-01T08:00:00".to_string(),
        seat: SeatData { row: 12, letter: 'C' },
        passenger: PassengerData {
            first_name: "Ana".to_string(),
            last_name: "Pop".to_string(),
        },
    }
    .into()
}

fn flights_response(count: usize) -> Message {
    GetFlightsResponse {
        flights: (0..count)
            .map(|i| FlightData {
                number: format!("F{:05}", i),
                company: "Tarom".to_string(),
            })
            .collect(),
    }
    .into()
}

fn bench_command_encode(c: &mut Criterion) {
    let command = create_booking_command();

    c.bench_function("command_encode", |b| {
        b.iter(|| black_box(Encoder::encode_line(&command).unwrap()));
    });
}

fn bench_command_decode(c: &mut Criterion) {
    let line = Encoder::encode_line(&create_booking_command()).unwrap();

    let mut group = c.benchmark_group("command_decode");
    group.throughput(Throughput::Bytes(line.len() as u64));
    group.bench_function("create_booking", |b| {
        b.iter(|| black_box(Decoder::decode_slice(&line).unwrap()));
    });
    group.finish();
}

fn bench_listing_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("listing_roundtrip");

    for count in [10, 100, 1000] {
        let response = flights_response(count);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &response, |b, response| {
            b.iter(|| {
                let line = Encoder::encode_line(response).unwrap();
                black_box(Decoder::decode_slice(&line).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let registry = HandlerRegistry::new();
    let mapper = WireMapper::new();
    let service = InMemoryFlightService::new();
    for i in 0..1000 {
        service
            .create_flight(Flight::new(format!("F{:05}", i), "Tarom"))
            .unwrap();
    }

    let find: Message = FindFlightCommand {
        number: "F00500".to_string(),
    }
    .into();

    c.bench_function("dispatch_find_flight", |b| {
        b.iter(|| black_box(registry.dispatch(find.clone(), &service, &mapper).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_command_encode,
    bench_command_decode,
    bench_listing_roundtrip,
    bench_dispatch,
);
criterion_main!(benches);
