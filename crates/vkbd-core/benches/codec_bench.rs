//! Criterion benchmarks for the uinput record encoder.
//!
//! A key press writes four `input_event` records, so event encoding cost is
//! paid four times per press.
//!
//! Run with:
//! ```bash
//! cargo bench --package vkbd-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vkbd_core::keymap::linux::KEY_A;
use vkbd_core::protocol::{encode_input_event, encode_user_dev, DeviceId, InputEvent, KeyValue};

fn bench_encode_input_event(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_input_event");

    let down = InputEvent::key(KEY_A as u16, KeyValue::Pressed);
    group.bench_function("encode_key_event", |b| {
        b.iter(|| encode_input_event(black_box(&down)))
    });

    group.bench_function("encode_press_sequence", |b| {
        let up = InputEvent::key(KEY_A as u16, KeyValue::Released);
        let sync = InputEvent::sync_report();
        b.iter(|| {
            [down, sync, up, sync]
                .iter()
                .map(|event| encode_input_event(black_box(event)))
                .collect::<Vec<_>>()
        })
    });

    group.finish();
}

fn bench_encode_user_dev(c: &mut Criterion) {
    c.bench_function("codec_encode_user_dev", |b| {
        b.iter(|| encode_user_dev(black_box(b"vkbd virtual keyboard"), DeviceId::default()))
    });
}

criterion_group!(benches, bench_encode_input_event, bench_encode_user_dev);
criterion_main!(benches);
