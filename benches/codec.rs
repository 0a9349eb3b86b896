//! Benchmarks for packet framing

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use ws_link::codec::{decode, encode, Packet};

fn benchmark_encode_text(c: &mut Criterion) {
    let packet = Packet::text(json!({
        "type": "help_request",
        "data": {
            "coordinates": "40.7657796,43.8338588",
            "address": "Lalayan St, Gyumri, Armenia",
            "message": "Please help me!!!",
            "country_code": "am",
            "language_code": "en"
        }
    }));

    c.bench_function("encode_text", |b| b.iter(|| encode(black_box(&packet))));
}

fn benchmark_round_trip_attachment(c: &mut Criterion) {
    let packet = Packet::binary_attachment(json!({"name": "snapshot.bin"}), vec![0xA5; 64 * 1024]);

    c.bench_function("round_trip_attachment", |b| {
        b.iter(|| decode(black_box(&encode(black_box(&packet)))))
    });
}

criterion_group!(benches, benchmark_encode_text, benchmark_round_trip_attachment);
criterion_main!(benches);
