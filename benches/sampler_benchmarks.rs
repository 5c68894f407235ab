//! Performance benchmarks for frame sampling
//!
//! Run with: cargo bench --bench sampler_benchmarks
//!
//! Enrollment samples every 300 ms and recognition every 180 ms, so encoding a
//! frame has to stay well below those periods at common webcam resolutions.

use crabface::sampler::{encode_jpeg, DEFAULT_JPEG_QUALITY};
use crabface::testing::synthetic_video_frame;
use crabface::types::FramePayload;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

fn bench_jpeg_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("JPEG Encoding");
    group.measurement_time(Duration::from_secs(10));

    for &(width, height, label) in &[(640, 480, "480p"), (1280, 720, "720p"), (1920, 1080, "1080p")] {
        let frame = synthetic_video_frame(7, width, height);
        group.throughput(Throughput::Bytes((width * height * 3) as u64));
        group.bench_with_input(BenchmarkId::new("quality_90", label), &frame, |b, frame| {
            b.iter(|| encode_jpeg(black_box(frame), DEFAULT_JPEG_QUALITY))
        });
    }

    group.finish();
}

fn bench_data_url(c: &mut Criterion) {
    let frame = synthetic_video_frame(3, 640, 480);
    let jpeg = encode_jpeg(&frame, DEFAULT_JPEG_QUALITY).expect("encode");
    let payload = FramePayload::new(jpeg, 640, 480, 0);

    c.bench_function("data_url_480p", |b| b.iter(|| black_box(&payload).to_data_url()));
}

criterion_group!(benches, bench_jpeg_encoding, bench_data_url);
criterion_main!(benches);
