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

//! Construction parameters of the detector and their documented defaults.

use crate::detector::StrategyKind;
use core::time::Duration;
use thiserror::Error;

/// Default ratio of the running maximum a band value must reach to trigger
/// a beat.
pub const DEFAULT_BEAT_THRESHOLD: f64 = 0.9;
/// Default ratio of the running maximum a band value must fall below to
/// re-arm the band.
pub const DEFAULT_RESET_THRESHOLD: f64 = 0.3;
/// Initial running maximum of every band. Keeps silence and faint noise
/// from ever counting as a beat.
pub const DEFAULT_RUNNING_MAX_FLOOR: f64 = 10.0;
/// Default threshold for the smoothed spectral flux.
pub const DEFAULT_FLUX_THRESHOLD: f32 = 7.0;
/// Default minimum time between two spectral-flux onsets.
pub const DEFAULT_MIN_GAP: Duration = Duration::from_millis(200);

/// Possible errors when validating a [`DetectorConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The sampling rate is zero.
    #[error("the sampling rate must be greater than zero")]
    ZeroSampleRate,
    /// The frame size is not a power of two or too small.
    #[error("frame size {0} is not a power of two >= 2")]
    InvalidFrameSize(usize),
    /// A hysteresis threshold is not a finite ratio in `(0.0, 1.0]`.
    #[error("{name} {value} is not a finite ratio in (0.0, 1.0]")]
    InvalidThreshold {
        /// Name of the option.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// The reset threshold is above the beat threshold, so a band could
    /// never re-arm after a beat.
    #[error("reset threshold {reset} must not exceed the beat threshold {beat}")]
    ResetAboveBeatThreshold {
        /// The configured reset threshold.
        reset: f64,
        /// The configured beat threshold.
        beat: f64,
    },
    /// The running maximum floor is not a finite positive number.
    #[error("running maximum floor {0} is not a finite positive number")]
    InvalidRunningMaxFloor(f64),
    /// The flux threshold is negative or not finite.
    #[error("flux threshold {0} is not a finite non-negative number")]
    InvalidFluxThreshold(f32),
    /// No detection strategy was selected.
    #[error("at least one detection strategy must be selected")]
    NoStrategy,
}

/// Tunables of the frequency-band strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandEngineConfig {
    /// A band raises a beat once its value reaches
    /// `running_max * beat_threshold`. Default: `0.9`.
    pub beat_threshold: f64,
    /// A band re-arms once its value drops below
    /// `running_max * reset_threshold`. Default: `0.3`.
    pub reset_threshold: f64,
    /// Seed of every running maximum. Default: `10.0`.
    pub running_max_floor: f64,
}

impl Default for BandEngineConfig {
    fn default() -> Self {
        Self {
            beat_threshold: DEFAULT_BEAT_THRESHOLD,
            reset_threshold: DEFAULT_RESET_THRESHOLD,
            running_max_floor: DEFAULT_RUNNING_MAX_FLOOR,
        }
    }
}

/// Tunables of the spectral-flux strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxEngineConfig {
    /// An onset needs a smoothed flux strictly above this value.
    /// Default: `7.0`.
    pub flux_threshold: f32,
    /// Two onsets are always more than this apart. Default: `200 ms`.
    pub min_gap: Duration,
}

impl Default for FluxEngineConfig {
    fn default() -> Self {
        Self {
            flux_threshold: DEFAULT_FLUX_THRESHOLD,
            min_gap: DEFAULT_MIN_GAP,
        }
    }
}

/// Configuration of a [`crate::BeatDetector`] and its engines.
///
/// Every `with_*` setter changes exactly one option. All other options keep
/// their documented defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Sampling rate of the audio in Hz, for example `44100`.
    pub sample_rate_hz: u32,
    /// Number of samples per frame. Must be a power of two.
    pub frame_size: usize,
    /// Enabled strategies, in the order their events are reported.
    /// Default: [`StrategyKind::FrequencyBands`].
    pub strategies: Vec<StrategyKind>,
    /// Tunables of the frequency-band strategy.
    pub bands: BandEngineConfig,
    /// Tunables of the spectral-flux strategy.
    pub flux: FluxEngineConfig,
}

impl DetectorConfig {
    /// Creates a configuration with default tunables.
    pub fn new(sample_rate_hz: u32, frame_size: usize) -> Self {
        Self {
            sample_rate_hz,
            frame_size,
            strategies: vec![StrategyKind::FrequencyBands],
            bands: BandEngineConfig::default(),
            flux: FluxEngineConfig::default(),
        }
    }

    /// Selects the detection strategies.
    #[must_use]
    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = StrategyKind>) -> Self {
        self.strategies = strategies.into_iter().collect();
        self
    }

    /// Sets [`BandEngineConfig::beat_threshold`].
    #[must_use]
    pub fn with_beat_threshold(mut self, beat_threshold: f64) -> Self {
        self.bands.beat_threshold = beat_threshold;
        self
    }

    /// Sets [`BandEngineConfig::reset_threshold`].
    #[must_use]
    pub fn with_reset_threshold(mut self, reset_threshold: f64) -> Self {
        self.bands.reset_threshold = reset_threshold;
        self
    }

    /// Sets [`BandEngineConfig::running_max_floor`].
    #[must_use]
    pub fn with_running_max_floor(mut self, floor: f64) -> Self {
        self.bands.running_max_floor = floor;
        self
    }

    /// Sets [`FluxEngineConfig::flux_threshold`].
    #[must_use]
    pub fn with_flux_threshold(mut self, flux_threshold: f32) -> Self {
        self.flux.flux_threshold = flux_threshold;
        self
    }

    /// Sets [`FluxEngineConfig::min_gap`].
    #[must_use]
    pub fn with_min_gap(mut self, min_gap: Duration) -> Self {
        self.flux.min_gap = min_gap;
        self
    }

    /// Duration covered by a single frame.
    #[must_use]
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_size as f64 / self.sample_rate_hz as f64)
    }

    /// Width of one FFT bin in Hz.
    #[must_use]
    pub fn bin_resolution_hz(&self) -> f64 {
        self.sample_rate_hz as f64 / self.frame_size as f64
    }

    /// Checks all options. Engines refuse to start with an invalid
    /// configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.frame_size < 2 || !self.frame_size.is_power_of_two() {
            return Err(ConfigError::InvalidFrameSize(self.frame_size));
        }
        if self.strategies.is_empty() {
            return Err(ConfigError::NoStrategy);
        }

        let BandEngineConfig {
            beat_threshold,
            reset_threshold,
            running_max_floor,
        } = self.bands;
        for (name, value) in [
            ("beat threshold", beat_threshold),
            ("reset threshold", reset_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        if reset_threshold > beat_threshold {
            return Err(ConfigError::ResetAboveBeatThreshold {
                reset: reset_threshold,
                beat: beat_threshold,
            });
        }
        if !running_max_floor.is_finite() || running_max_floor <= 0.0 {
            return Err(ConfigError::InvalidRunningMaxFloor(running_max_floor));
        }

        let flux_threshold = self.flux.flux_threshold;
        if !flux_threshold.is_finite() || flux_threshold < 0.0 {
            return Err(ConfigError::InvalidFluxThreshold(flux_threshold));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn defaults_are_documented_values() {
        let config = DetectorConfig::new(44100, 1024);
        check!(config.bands.beat_threshold == 0.9);
        check!(config.bands.reset_threshold == 0.3);
        check!(config.bands.running_max_floor == 10.0);
        check!(config.flux.flux_threshold == 7.0);
        check!(config.flux.min_gap == Duration::from_millis(200));
        check!(config.strategies == [StrategyKind::FrequencyBands]);
        check!(config.validate() == Ok(()));
    }

    #[test]
    fn setters_only_touch_their_option() {
        let default = DetectorConfig::new(44100, 1024);

        let config = default.clone().with_flux_threshold(3.0);
        check!(config.flux.flux_threshold == 3.0);
        check!(config.flux.min_gap == default.flux.min_gap);
        check!(config.bands == default.bands);

        let config = default.clone().with_reset_threshold(0.5);
        check!(config.bands.reset_threshold == 0.5);
        check!(config.bands.beat_threshold == default.bands.beat_threshold);
        check!(config.bands.running_max_floor == default.bands.running_max_floor);
        check!(config.flux == default.flux);
    }

    #[test]
    fn frame_timing() {
        let config = DetectorConfig::new(44100, 1024);
        check!(config.frame_duration().as_micros() == 23219);
        check!(float_cmp::approx_eq!(
            f64,
            config.bin_resolution_hz(),
            43.06640625,
            epsilon = 1e-9
        ));
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        check!(DetectorConfig::new(0, 1024).validate() == Err(ConfigError::ZeroSampleRate));
        check!(
            DetectorConfig::new(44100, 1000).validate() == Err(ConfigError::InvalidFrameSize(1000))
        );
        check!(DetectorConfig::new(44100, 1).validate() == Err(ConfigError::InvalidFrameSize(1)));
        check!(
            DetectorConfig::new(44100, 1024)
                .with_strategies(Vec::new())
                .validate()
                == Err(ConfigError::NoStrategy)
        );
        check!(matches!(
            DetectorConfig::new(44100, 1024)
                .with_beat_threshold(f64::NAN)
                .validate(),
            Err(ConfigError::InvalidThreshold {
                name: "beat threshold",
                ..
            })
        ));
        check!(
            DetectorConfig::new(44100, 1024)
                .with_reset_threshold(0.95)
                .validate()
                == Err(ConfigError::ResetAboveBeatThreshold {
                    reset: 0.95,
                    beat: 0.9
                })
        );
        check!(
            DetectorConfig::new(44100, 1024)
                .with_running_max_floor(0.0)
                .validate()
                == Err(ConfigError::InvalidRunningMaxFloor(0.0))
        );
        check!(
            DetectorConfig::new(44100, 1024)
                .with_flux_threshold(-1.0)
                .validate()
                == Err(ConfigError::InvalidFluxThreshold(-1.0))
        );
    }
}
