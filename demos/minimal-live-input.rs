//! Detects beats from the selected audio input device and prints them.
//! Stop with CTRL+C.

use spectral_beat_detector::{recording, StrategyKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[path = "_modules/example_utils.rs"]
mod example_utils;

fn main() {
    example_utils::init_logger();
    let input_device = example_utils::select_audio_device();

    let stop_recording = Arc::new(AtomicBool::new(false));
    {
        let stop_recording = stop_recording.clone();
        ctrlc::set_handler(move || {
            stop_recording.store(true, Ordering::SeqCst);
        })
        .unwrap();
    }

    let _handle = recording::start_detector_thread(
        |event| {
            println!("{:<8}{event}", event.source().marker());
        },
        Some(input_device),
        1024,
        vec![StrategyKind::FrequencyBands, StrategyKind::SpectralFlux],
    )
    .unwrap();

    log::info!("Start recording");
    while !stop_recording.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    log::info!("Stopped recording");
}
