//! Feeds a synthetic kick drum pattern (a 86 Hz burst every 500 ms on top of
//! a quiet hi-hat noise floor) into both strategies and prints the beats.

use spectral_beat_detector::{BeatDetector, DetectorConfig, FrameBuffer, StrategyKind};

const SAMPLE_RATE: u32 = 44100;
const FRAME_SIZE: usize = 1024;

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init()
        .unwrap();

    let config = DetectorConfig::new(SAMPLE_RATE, FRAME_SIZE)
        .with_strategies([StrategyKind::FrequencyBands, StrategyKind::SpectralFlux]);
    let mut detector = BeatDetector::new(config).unwrap();

    // four seconds of audio, delivered in blocks of 441 samples (10 ms)
    let audio = (0..SAMPLE_RATE as usize * 4)
        .map(|n| {
            let t = n as f32 / SAMPLE_RATE as f32;
            let since_kick = t % 0.5;
            let kick = if since_kick < 0.1 {
                (1.0 - since_kick * 10.0) * (2.0 * core::f32::consts::PI * 86.0 * t).sin()
            } else {
                0.0
            };
            let hihat = 0.01 * (rand::random::<f32>() - 0.5);
            0.8 * kick + hihat
        })
        .collect::<Vec<_>>();

    let mut frames = FrameBuffer::new(FRAME_SIZE);
    for block in audio.chunks(441) {
        frames
            .feed(block, |frame| {
                for event in detector.process(frame)? {
                    println!("{:<8}{event}", event.source().marker());
                }
                Ok::<_, spectral_beat_detector::FrameError>(())
            })
            .unwrap();
    }
}
