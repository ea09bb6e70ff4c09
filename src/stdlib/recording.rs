/*
MIT License

Copyright (c) 2024 Philipp Schuster

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Module for beat detection on an audio input device.

use crate::{BeatDetector, BeatEvent, ConfigError, DetectorConfig, FrameBuffer, StrategyKind};
use core::fmt::{Display, Formatter};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, StreamConfig};
use std::error::Error;
use std::time::{Duration, Instant};

/// Errors of [`start_detector_thread`].
#[derive(Debug)]
pub enum StartDetectorThreadError {
    /// There was no audio device provided and no default device can be found.
    NoDefaultAudioDevice,
    /// There was a problem detecting the input stream config.
    InputConfigError(cpal::DefaultStreamConfigError),
    /// The detector can't be built for the input configuration.
    InvalidDetectorConfig(ConfigError),
    /// Failed to build an input stream.
    FailedBuildingInputStream(cpal::BuildStreamError),
    /// The input stream could not be started.
    InputError(cpal::PlayStreamError),
}

impl Display for StartDetectorThreadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{:?}", self))
    }
}

impl std::error::Error for StartDetectorThreadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InputConfigError(err) => Some(err),
            Self::InvalidDetectorConfig(err) => Some(err),
            Self::FailedBuildingInputStream(err) => Some(err),
            Self::InputError(err) => Some(err),
            Self::NoDefaultAudioDevice => None,
        }
    }
}

/// Starts a stream (a thread) that feeds the audio input frame by frame into
/// a [`BeatDetector`] running the given strategies, and invokes the callback
/// for every [`BeatEvent`]. The stream lives as long as the returned handle.
///
/// The sampling rate is taken from the input device. The device delivers
/// blocks of arbitrary length, which are cut into frames of `frame_size`
/// samples.
pub fn start_detector_thread(
    on_beat_cb: impl Fn(BeatEvent) + Send + 'static,
    preferred_input_dev: Option<cpal::Device>,
    frame_size: usize,
    strategies: Vec<StrategyKind>,
) -> Result<cpal::Stream, StartDetectorThreadError> {
    let input_dev = preferred_input_dev.map(Ok).unwrap_or_else(|| {
        let host = cpal::default_host();
        log::debug!("Using '{:?}' as input framework", host.id());
        host.default_input_device()
            .ok_or(StartDetectorThreadError::NoDefaultAudioDevice)
    })?;

    log::debug!(
        "Using '{}' as input device",
        input_dev.name().unwrap_or_else(|_| "<unknown>".to_string())
    );

    let supported_input_config = input_dev
        .default_input_config()
        .map_err(StartDetectorThreadError::InputConfigError)?;

    log::trace!(
        "Supported input configurations: {:#?}",
        supported_input_config
    );

    let input_config = StreamConfig {
        channels: 1,
        sample_rate: supported_input_config.sample_rate(),
        buffer_size: BufferSize::Default,
    };

    log::debug!("Input configuration: {:#?}", input_config);

    let sampling_rate = input_config.sample_rate.0;
    let config = DetectorConfig::new(sampling_rate, frame_size).with_strategies(strategies);
    let mut detector =
        BeatDetector::new(config).map_err(StartDetectorThreadError::InvalidDetectorConfig)?;
    let mut frames = FrameBuffer::new(frame_size);

    // Under the hood, this spawns a thread.
    let stream = input_dev
        .build_input_stream(
            &input_config,
            move |data: &[f32], _info| {
                log::trace!(
                    "audio input callback: {} samples ({} ms, sampling rate = {sampling_rate})",
                    data.len(),
                    Duration::from_secs_f32(data.len() as f32 / sampling_rate as f32).as_millis()
                );

                let now = Instant::now();
                let result = frames.feed(data, |frame| {
                    detector
                        .process(frame)
                        .map(|events| events.into_iter().for_each(&on_beat_cb))
                });
                log::trace!("Beat detection took {:?}", now.elapsed());

                if let Err(e) = result {
                    log::error!("Dropped frame: {e}");
                }
            },
            |e| {
                log::error!("Input error: {e:#?}");
            },
            // Timeout: worst case max blocking time
            // Don't see too short, as otherwise, the error callback will be
            // invoked frequently.
            // https://github.com/RustAudio/cpal/pull/696
            Some(Duration::from_secs(1)),
        )
        .map_err(StartDetectorThreadError::FailedBuildingInputStream)?;

    stream
        .play()
        .map_err(StartDetectorThreadError::InputError)?;

    Ok(stream)
}
