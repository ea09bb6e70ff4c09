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

//! Beat and onset detection on a live stream of mono audio frames.
//!
//! The caller hands the detector one frame of `N` samples at a time, where
//! `N` is a power of two fixed at construction time. Each frame runs through
//! an unscaled forward FFT and then through one or both detection strategies:
//!
//! - **Frequency bands** ([`FrequencyBandEngine`]): seven perceptual bands
//!   from sub-bass to brilliance. Each band tracks a running maximum and
//!   raises a beat with hysteresis (trigger at 90 % of the running maximum,
//!   re-arm below 30 %).
//! - **Spectral flux** ([`SpectralFluxEngine`]): half-wave rectified
//!   frame-over-frame magnitude increase, smoothed over the last ten frames
//!   and compared against a fixed threshold, with a minimum gap between
//!   two onsets.
//!
//! The detector never modifies the samples it inspects and never performs
//! I/O on its own. Detected beats are returned as [`BeatEvent`]s so that the
//! caller decides how to render them.
//!
//! ## Example
//! ```rust
//! use spectral_beat_detector::{BeatDetector, DetectorConfig, StrategyKind};
//!
//! let config = DetectorConfig::new(44100, 1024)
//!     .with_strategies([StrategyKind::FrequencyBands, StrategyKind::SpectralFlux]);
//! let mut detector = BeatDetector::new(config).unwrap();
//!
//! // Regularly call this with the latest frame of mono audio.
//! let frame = [0.0_f32; 1024];
//! let events = detector.process(&frame).unwrap();
//! assert!(events.is_empty());
//! ```
//!
//! Audio sources rarely deliver blocks of exactly `N` samples. Use
//! [`FrameBuffer`] to cut arbitrary (and optionally interleaved) blocks into
//! frames.

#![deny(missing_debug_implementations)]
#![warn(missing_docs)]

mod band_engine;
mod bands;
mod config;
mod detector;
mod event;
mod flux_engine;
mod frame_buffer;
mod spectrum;
mod timeline;

/// Live audio input via `cpal`.
#[cfg(feature = "recording")]
pub mod stdlib;
pub mod util;

#[cfg(test)]
mod test_utils;

pub use band_engine::{BandState, FrequencyBandEngine};
pub use bands::{BandBins, FrequencyBand};
pub use config::{
    BandEngineConfig, ConfigError, DetectorConfig, FluxEngineConfig, DEFAULT_BEAT_THRESHOLD,
    DEFAULT_FLUX_THRESHOLD, DEFAULT_MIN_GAP, DEFAULT_RESET_THRESHOLD, DEFAULT_RUNNING_MAX_FLOOR,
};
pub use detector::{BeatDetector, Strategy, StrategyKind};
pub use event::{BeatEvent, BeatSource};
pub use flux_engine::{FluxHistory, SpectralFluxEngine, FLUX_HISTORY_LEN};
pub use frame_buffer::FrameBuffer;
pub use spectrum::{bin_freq, FrameError, Spectrum, SpectrumAnalyzer};
pub use timeline::Timeline;

#[cfg(feature = "recording")]
pub use stdlib::recording;
