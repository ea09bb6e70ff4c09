//! Benchmarks the per-frame cost of both strategies. A frame must be
//! processed in far less time than it takes to play it back (23 ms for 1024
//! samples at 44.1 kHz).
//!
//! To run these, run `$ cargo bench "beat detection"`

use criterion::{criterion_group, criterion_main, Criterion};
use spectral_beat_detector::{BeatDetector, DetectorConfig, SpectrumAnalyzer, StrategyKind};
use std::hint::black_box;

fn noise_frame(frame_size: usize) -> Vec<f32> {
    let mut frame = vec![0.0; frame_size];
    frame.fill_with(|| rand::random::<f32>() * 2.0 - 1.0);
    frame
}

fn criterion_benchmark(c: &mut Criterion) {
    for frame_size in [1024, 2048] {
        let frame = noise_frame(frame_size);

        let mut analyzer = SpectrumAnalyzer::new(44100, frame_size);
        c.bench_function(&format!("spectrum of {frame_size} samples"), |b| {
            b.iter(|| {
                let _ = black_box(analyzer.analyze(black_box(&frame)));
            })
        });

        for kind in [StrategyKind::FrequencyBands, StrategyKind::SpectralFlux] {
            let config = DetectorConfig::new(44100, frame_size).with_strategies([kind]);
            let mut detector = BeatDetector::new(config).unwrap();
            c.bench_function(
                &format!("beat detection ({kind}) with {frame_size} samples per frame"),
                |b| {
                    b.iter(|| {
                        // We do not care about the correct detection, only
                        // about the overall calculation time.
                        let _ = black_box(detector.process(black_box(&frame)));
                    })
                },
            );
        }
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
