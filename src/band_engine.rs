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

//! Module for [`FrequencyBandEngine`].

use crate::bands::{BandBins, FrequencyBand};
use crate::config::{ConfigError, DetectorConfig};
use crate::detector::{Strategy, StrategyKind};
use crate::event::{BeatEvent, BeatSource};
use crate::spectrum::{FrameError, SpectrumAnalyzer};
use crate::timeline::Timeline;
use core::time::Duration;

/// Per-band detection state that lives across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandState {
    /// Largest band value seen so far, seeded with a floor. Never decreases.
    running_max: f64,
    /// Hysteresis latch. Set on a beat, cleared once the value falls below
    /// the reset threshold.
    beat_flag: bool,
}

impl BandState {
    /// Creates a fresh state whose running maximum starts at `floor`.
    #[must_use]
    pub const fn new(floor: f64) -> Self {
        Self {
            running_max: floor,
            beat_flag: false,
        }
    }

    /// Largest band value seen so far.
    #[must_use]
    pub const fn running_max(&self) -> f64 {
        self.running_max
    }

    /// Whether the band is currently latched.
    #[must_use]
    pub const fn beat_flag(&self) -> bool {
        self.beat_flag
    }

    /// Feeds the band value of the current frame. Returns `true` if this
    /// frame raises a beat, i.e., on the rising edge of the latch.
    pub fn update(&mut self, value: f64, beat_threshold: f64, reset_threshold: f64) -> bool {
        self.running_max = self.running_max.max(value);

        if value >= self.running_max * beat_threshold && !self.beat_flag {
            self.beat_flag = true;
            true
        } else if value < self.running_max * reset_threshold {
            self.beat_flag = false;
            false
        } else {
            false
        }
    }
}

/// A band together with its bins and state.
#[derive(Debug, Clone)]
struct BandChannel {
    band: FrequencyBand,
    bins: BandBins,
    state: BandState,
}

/// Detects beats independently in each of the seven [`FrequencyBand`]s.
///
/// The value of a band is the maximum magnitude of its bins. A band raises
/// a beat when its value reaches `beat_threshold` (default 90 %) of the
/// band's running maximum and stays silent until the value dropped below
/// `reset_threshold` (default 30 %). A single frame can therefore produce
/// up to seven events, one per band.
#[derive(Debug)]
pub struct FrequencyBandEngine {
    analyzer: SpectrumAnalyzer,
    channels: Vec<BandChannel>,
    beat_threshold: f64,
    reset_threshold: f64,
    timeline: Timeline,
}

impl FrequencyBandEngine {
    /// Creates a new engine. Fails if the configuration is invalid.
    pub fn new(config: &DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let channels = FrequencyBand::ALL
            .iter()
            .map(|&band| BandChannel {
                band,
                bins: BandBins::for_band(band, config.sample_rate_hz, config.frame_size),
                state: BandState::new(config.bands.running_max_floor),
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Frequency band engine: {} Hz, {} samples per frame, {:.2} Hz per bin",
            config.sample_rate_hz,
            config.frame_size,
            config.bin_resolution_hz()
        );

        Ok(Self {
            analyzer: SpectrumAnalyzer::new(config.sample_rate_hz, config.frame_size),
            channels,
            beat_threshold: config.bands.beat_threshold,
            reset_threshold: config.bands.reset_threshold,
            timeline: Timeline::new(config.sample_rate_hz, config.frame_size),
        })
    }

    /// Analyzes the next frame and returns the beats it raises, ordered
    /// from low to high bands.
    pub fn process(&mut self, frame: &[f32]) -> Result<Vec<BeatEvent>, FrameError> {
        let spectrum = self.analyzer.analyze(frame)?;
        let timestamp = self.timeline.elapsed();
        let (beat_threshold, reset_threshold) = (self.beat_threshold, self.reset_threshold);

        let events = self
            .channels
            .iter_mut()
            .filter_map(|channel| {
                let value = channel.bins.value(&spectrum)?;
                channel
                    .state
                    .update(value, beat_threshold, reset_threshold)
                    .then(|| BeatEvent::new(BeatSource::Band(channel.band), timestamp))
            })
            .collect::<Vec<_>>();

        if !events.is_empty() {
            log::trace!(
                "{} band beat(s) at {:?}, peak frequency {:.1} Hz",
                events.len(),
                timestamp,
                spectrum.peak_frequency()
            );
            self.timeline.mark_beat();
        }
        self.timeline.advance();

        Ok(events)
    }

    /// The current state of `band`.
    #[must_use]
    pub fn band_state(&self, band: FrequencyBand) -> Option<BandState> {
        self.channels
            .iter()
            .find(|channel| channel.band == band)
            .map(|channel| channel.state)
    }

    /// The bins `band` reads its value from.
    #[must_use]
    pub fn band_bins(&self, band: FrequencyBand) -> Option<&BandBins> {
        self.channels
            .iter()
            .find(|channel| channel.band == band)
            .map(|channel| &channel.bins)
    }

    /// Audio time processed so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.timeline.elapsed()
    }

    /// Timestamp of the most recent beat in any band.
    #[must_use]
    pub const fn last_beat(&self) -> Option<Duration> {
        self.timeline.last_beat()
    }
}

impl Strategy for FrequencyBandEngine {
    fn process(&mut self, frame: &[f32]) -> Result<Vec<BeatEvent>, FrameError> {
        Self::process(self, frame)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::FrequencyBands
    }
}
