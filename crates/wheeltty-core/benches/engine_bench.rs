use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use wheeltty_core::{BusWord, KeyDecoder, Pitch, PrintEngine};

/// A page of host output with the escapes a word processor would send.
fn host_page() -> Vec<u8> {
    let mut page = Vec::new();
    for line in 0..60 {
        if line % 10 == 0 {
            page.extend_from_slice(b"\x1bO");
        }
        page.extend_from_slice(b"The quick brown fox\tjumps over the lazy dog.");
        if line % 10 == 0 {
            page.extend_from_slice(b"\x1b&");
        }
        if line % 7 == 0 {
            page.extend_from_slice(b" \x1bEunderlined\x1bR");
        }
        page.extend_from_slice(b"\r\n");
    }
    page
}

/// Keystroke traffic as the Function Board sends it: sentinel, print
/// opcode, wheel code, advance.
fn keystrokes(count: usize) -> Vec<BusWord> {
    let codes = [0x01u16, 0x59, 0x05, 0x07, 0x60, 0x0A, 0x5A, 0x08];
    (0..count)
        .flat_map(|i| [0x121, 0x003, codes[i % codes.len()], 0x00A])
        .map(BusWord::new)
        .collect()
}

fn bench_engine(c: &mut Criterion) {
    let page = host_page();
    let mut group = c.benchmark_group("print_engine");
    group.throughput(Throughput::Bytes(page.len() as u64));
    for pitch in [Pitch::PICA, Pitch::MICRO_ELITE] {
        group.bench_function(
            BenchmarkId::from_parameter(pitch.micro_spaces_per_char),
            |b| {
                b.iter(|| {
                    let mut engine = PrintEngine::new(pitch);
                    black_box(engine.feed(black_box(&page)))
                });
            },
        );
    }
    group.finish();
}

fn bench_decoder(c: &mut Criterion) {
    let words = keystrokes(1024);
    let mut group = c.benchmark_group("key_decoder");
    group.throughput(Throughput::Elements(words.len() as u64));
    group.bench_function("decode", |b| {
        b.iter(|| {
            let mut decoder = KeyDecoder::new();
            let mut decoded = 0usize;
            for &word in &words {
                if decoder.decode(black_box(word), Pitch::ELITE).is_some() {
                    decoded += 1;
                }
            }
            black_box(decoded)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_engine, bench_decoder);
criterion_main!(benches);
