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

//! Module for [`SpectralFluxEngine`].

use crate::config::{ConfigError, DetectorConfig};
use crate::detector::{Strategy, StrategyKind};
use crate::event::{BeatEvent, BeatSource};
use crate::spectrum::{FrameError, SpectrumAnalyzer};
use crate::timeline::Timeline;
use core::time::Duration;
use ringbuffer::{ConstGenericRingBuffer, RingBuffer};

/// Number of flux values the smoothing window spans. At 1024 samples and
/// 44.1 kHz this is roughly 230 ms.
pub const FLUX_HISTORY_LEN: usize = 10;

/// Trailing window of the most recent spectral-flux values in arrival order.
/// Once full, every new value evicts the oldest one.
#[derive(Debug)]
pub struct FluxHistory {
    values: ConstGenericRingBuffer<f32, FLUX_HISTORY_LEN>,
}

impl Default for FluxHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl FluxHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: ConstGenericRingBuffer::new(),
        }
    }

    /// Appends the flux of the latest frame.
    pub fn push(&mut self, flux: f32) {
        self.values.push(flux);
    }

    /// Number of stored values, at most [`FLUX_HISTORY_LEN`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value was pushed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates the values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    /// Arithmetic mean of the stored values, `0.0` when empty.
    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.iter().sum::<f32>() / self.len() as f32
        }
    }
}

/// Detects onsets of the whole spectrum by spectral flux.
///
/// For every frame, the magnitudes below Nyquist are normalized (only if the
/// loudest of them exceeds `1.0`) and compared bin by bin against the
/// previous frame. The flux is the sum of all increases; decreases are
/// ignored. An onset is
/// raised when the mean flux of the last [`FLUX_HISTORY_LEN`] frames exceeds
/// the flux threshold and the previous onset is more than the minimum gap
/// ago.
///
/// The very first frame is compared against silence, so its flux equals its
/// total (normalized) energy. As there is no previous onset yet, a loud,
/// broadband first frame raises an onset at `t = 0`.
#[derive(Debug)]
pub struct SpectralFluxEngine {
    analyzer: SpectrumAnalyzer,
    /// Normalized magnitudes of the previous frame, `N / 2` bins. Owned copy,
    /// never shared with the analyzer.
    previous: Vec<f32>,
    history: FluxHistory,
    flux_threshold: f32,
    min_gap: Duration,
    last_flux: f32,
    timeline: Timeline,
}

impl SpectralFluxEngine {
    /// Creates a new engine. Fails if the configuration is invalid.
    pub fn new(config: &DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        log::debug!(
            "Spectral flux engine: {} Hz, {} samples per frame, threshold {}, min gap {:?}",
            config.sample_rate_hz,
            config.frame_size,
            config.flux.flux_threshold,
            config.flux.min_gap
        );

        Ok(Self {
            analyzer: SpectrumAnalyzer::new(config.sample_rate_hz, config.frame_size),
            previous: vec![0.0; config.frame_size / 2],
            history: FluxHistory::new(),
            flux_threshold: config.flux.flux_threshold,
            min_gap: config.flux.min_gap,
            last_flux: 0.0,
            timeline: Timeline::new(config.sample_rate_hz, config.frame_size),
        })
    }

    /// Analyzes the next frame. Returns at most one onset.
    pub fn process(&mut self, frame: &[f32]) -> Result<Vec<BeatEvent>, FrameError> {
        let mut spectrum = self.analyzer.analyze(frame)?;

        let max = spectrum.max_magnitude();
        if max > 1.0 {
            spectrum.scale(1.0 / max);
        }

        let mut flux = 0.0_f32;
        for (i, previous) in self.previous.iter_mut().enumerate() {
            let current = spectrum.magnitude(i);
            flux += (current - *previous).max(0.0);
            *previous = current;
        }
        if !flux.is_finite() {
            log::warn!("Non-finite spectral flux {flux}, counting it as zero");
            flux = 0.0;
        }
        self.last_flux = flux;
        self.history.push(flux);

        let mut events = Vec::new();
        let smoothed = self.history.mean();
        if smoothed > self.flux_threshold && self.timeline.gap_satisfied(self.min_gap) {
            self.timeline.mark_beat();
            let event = BeatEvent::new(BeatSource::Flux, self.timeline.elapsed());
            log::trace!("Onset at {:?}, smoothed flux {smoothed}", event.timestamp());
            events.push(event);
        }
        self.timeline.advance();

        Ok(events)
    }

    /// The flux values of the most recent frames.
    #[must_use]
    pub const fn history(&self) -> &FluxHistory {
        &self.history
    }

    /// Flux of the most recent frame.
    #[must_use]
    pub const fn last_flux(&self) -> f32 {
        self.last_flux
    }

    /// Mean flux over [`Self::history`].
    #[must_use]
    pub fn smoothed_flux(&self) -> f32 {
        self.history.mean()
    }

    /// Audio time processed so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.timeline.elapsed()
    }

    /// Timestamp of the most recent onset.
    #[must_use]
    pub const fn last_beat(&self) -> Option<Duration> {
        self.timeline.last_beat()
    }
}

impl Strategy for SpectralFluxEngine {
    fn process(&mut self, frame: &[f32]) -> Result<Vec<BeatEvent>, FrameError> {
        Self::process(self, frame)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::SpectralFlux
    }
}
