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

//! Module for [`BeatDetector`] and the common [`Strategy`] abstraction.

use crate::band_engine::FrequencyBandEngine;
use crate::config::{ConfigError, DetectorConfig};
use crate::event::BeatEvent;
use crate::flux_engine::SpectralFluxEngine;
use crate::spectrum::FrameError;
use core::fmt::{Debug, Display, Formatter};
use core::str::FromStr;

/// Common abstraction over a beat detection strategy. A strategy consumes
/// one frame per call and keeps whatever state it needs across frames.
pub trait Strategy: Debug {
    /// Analyzes the next frame and returns the beats found in it. A frame
    /// of the wrong length is rejected without touching any state.
    fn process(&mut self, frame: &[f32]) -> Result<Vec<BeatEvent>, FrameError>;

    /// Convenient getter to get the [`StrategyKind`] of a strategy.
    /// This is a 1:1 mapping.
    fn kind(&self) -> StrategyKind;
}

/// Enum that makes all [`Strategy`]s provided by this crate accessible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Per-band hysteresis. Corresponds to [`FrequencyBandEngine`].
    FrequencyBands,
    /// Smoothed spectral flux. Corresponds to [`SpectralFluxEngine`].
    SpectralFlux,
}

impl StrategyKind {
    /// Creates a concrete detector object, i.e. a struct that implements
    /// [`Strategy`] on that you can continuously analyze your audio frames.
    pub fn detector(self, config: &DetectorConfig) -> Result<Box<dyn Strategy + Send>, ConfigError> {
        let detector: Box<dyn Strategy + Send> = match self {
            Self::FrequencyBands => Box::new(FrequencyBandEngine::new(config)?),
            Self::SpectralFlux => Box::new(SpectralFluxEngine::new(config)?),
        };
        Ok(detector)
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bands" | "frequency-bands" => Ok(Self::FrequencyBands),
            "flux" | "spectral-flux" => Ok(Self::SpectralFlux),
            _ => Err(format!(
                "unknown strategy '{s}', expected 'bands' or 'flux'"
            )),
        }
    }
}

/// Beat detector that runs every strategy selected in its
/// [`DetectorConfig`] on each frame.
///
/// ## Example
/// ```rust
/// use spectral_beat_detector::{BeatDetector, DetectorConfig, StrategyKind};
///
/// let config = DetectorConfig::new(44100, 2048).with_strategies([StrategyKind::SpectralFlux]);
/// let mut detector = BeatDetector::new(config).unwrap();
///
/// // Regularly call this with the latest audio frame.
/// for event in detector.process(&[0.0; 2048]).unwrap() {
///     println!("{event}");
/// }
/// ```
#[derive(Debug)]
pub struct BeatDetector {
    config: DetectorConfig,
    engines: Vec<Box<dyn Strategy + Send>>,
}

impl BeatDetector {
    /// Creates one engine per selected strategy.
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let engines = config
            .strategies
            .iter()
            .map(|kind| kind.detector(&config))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "Beat detector with strategies {:?}, frame duration {:?}",
            config.strategies,
            config.frame_duration()
        );

        Ok(Self { config, engines })
    }

    /// Feeds one frame to all engines, in configuration order, and returns
    /// their combined events. The frame length is checked up front, so a
    /// malformed frame never reaches any engine.
    pub fn process(&mut self, frame: &[f32]) -> Result<Vec<BeatEvent>, FrameError> {
        if frame.len() != self.config.frame_size {
            return Err(FrameError::LengthMismatch {
                expected: self.config.frame_size,
                actual: frame.len(),
            });
        }

        let mut events = Vec::new();
        for engine in &mut self.engines {
            events.extend(engine.process(frame)?);
        }
        Ok(events)
    }

    /// The configuration the detector was built with.
    #[must_use]
    pub const fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// The kinds of the active strategies.
    pub fn strategies(&self) -> impl Iterator<Item = StrategyKind> + '_ {
        self.engines.iter().map(|engine| engine.kind())
    }
}

impl Display for StrategyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::FrequencyBands => "bands",
            Self::SpectralFlux => "flux",
        })
    }
}
