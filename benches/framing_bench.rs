//! Criterion benchmark untuk framing (send/receive state machines)
//!
//! Run dengan: cargo bench --bench framing_bench --features scripted

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use peerwire::network::{ReceptionHandler, SendingHandler};
use peerwire::platform::ScriptedSocket;
use peerwire::protocol::{encode_frame, Decoder};

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for size in [16usize, 1024, 65535] {
        let payload = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(format!("encode_{}", size), |b| {
            b.iter(|| black_box(encode_frame(black_box(&payload))));
        });

        let wire = encode_frame(&payload).unwrap_or_default();
        group.bench_function(format!("decode_{}", size), |b| {
            b.iter(|| {
                let mut decoder = Decoder::new(black_box(&wire));
                black_box(decoder.next::<u8>());
            });
        });
    }

    group.finish();
}

fn bench_sending(c: &mut Criterion) {
    let mut group = c.benchmark_group("sending");

    // Whole writes vs. a socket taking 1 KB per call
    for (name, chunk) in [("whole", None), ("chunked_1k", Some(1024))] {
        let payload = vec![7u8; 4096];
        group.throughput(Throughput::Bytes(payload.len() as u64 * 100));

        group.bench_function(name, |b| {
            let mut handler = SendingHandler::<u8>::new();
            let mut socket = ScriptedSocket::new();
            if let Some(n) = chunk {
                socket.set_write_chunk(n);
            }
            b.iter(|| {
                for _ in 0..100 {
                    let _ = handler.enqueue(&payload);
                }
                let _ = handler.send(&mut socket);
                black_box(socket.take_written());
            });
        });
    }

    group.finish();
}

fn bench_reception(c: &mut Criterion) {
    let mut group = c.benchmark_group("reception");

    for size in [16usize, 4096] {
        let frame = encode_frame(&vec![3u8; size]).unwrap_or_default();
        let wire: Vec<u8> = frame.iter().copied().cycle().take(frame.len() * 100).collect();
        group.throughput(Throughput::Elements(100));

        group.bench_function(format!("frames_{}", size), |b| {
            let mut handler = ReceptionHandler::<u8>::new();
            let mut socket = ScriptedSocket::new();
            b.iter(|| {
                socket.push_inbound(&wire);
                while let Some(event) = handler.receive(&mut socket) {
                    black_box(event);
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_codec, bench_sending, bench_reception);
criterion_main!(benches);
