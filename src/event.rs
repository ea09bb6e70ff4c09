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

//! Module for [`BeatEvent`].

use crate::bands::FrequencyBand;
use core::fmt::{Display, Formatter};
use core::time::Duration;

/// The stream a [`BeatEvent`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BeatSource {
    /// A beat of a single frequency band, see
    /// [`crate::FrequencyBandEngine`].
    Band(FrequencyBand),
    /// An onset of the whole spectrum, see [`crate::SpectralFluxEngine`].
    Flux,
}

impl BeatSource {
    /// Compact console marker: `>` for sub-bass up to `>>>>>>>` for
    /// brilliance, so that higher bands print longer arrows. Flux onsets
    /// are marked with `*`.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Band(FrequencyBand::SubBass) => ">",
            Self::Band(FrequencyBand::Bass) => ">>",
            Self::Band(FrequencyBand::LowMidrange) => ">>>",
            Self::Band(FrequencyBand::Midrange) => ">>>>",
            Self::Band(FrequencyBand::UpperMidrange) => ">>>>>",
            Self::Band(FrequencyBand::Presence) => ">>>>>>",
            Self::Band(FrequencyBand::Brilliance) => ">>>>>>>",
            Self::Flux => "*",
        }
    }
}

impl Display for BeatSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Band(band) => Display::fmt(band, f),
            Self::Flux => f.write_str("onset"),
        }
    }
}

/// A detected beat. Events are plain values without any reference to the
/// audio data that caused them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeatEvent {
    source: BeatSource,
    timestamp: Duration,
}

impl BeatEvent {
    /// Creates a new event.
    #[must_use]
    pub const fn new(source: BeatSource, timestamp: Duration) -> Self {
        Self { source, timestamp }
    }

    /// The band or stream the beat was detected in.
    #[must_use]
    pub const fn source(&self) -> BeatSource {
        self.source
    }

    /// The band, if the event comes from the frequency-band strategy.
    #[must_use]
    pub const fn band(&self) -> Option<FrequencyBand> {
        match self.source {
            BeatSource::Band(band) => Some(band),
            BeatSource::Flux => None,
        }
    }

    /// Start of the frame the beat was detected in, relative to the start
    /// of the session.
    #[must_use]
    pub const fn timestamp(&self) -> Duration {
        self.timestamp
    }
}

impl Display for BeatEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} @ {:.3}s", self.source, self.timestamp.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::format;

    #[test]
    fn display() {
        let event = BeatEvent::new(
            BeatSource::Band(FrequencyBand::Bass),
            Duration::from_millis(464),
        );
        check!(format!("{event}") == "bass @ 0.464s");
        check!(event.band() == Some(FrequencyBand::Bass));

        let event = BeatEvent::new(BeatSource::Flux, Duration::from_micros(139_320));
        check!(format!("{event}") == "onset @ 0.139s");
        check!(event.band() == None);
    }

    #[test]
    fn markers_grow_with_frequency() {
        let lengths = FrequencyBand::ALL.map(|band| BeatSource::Band(band).marker().len());
        check!(lengths == [1, 2, 3, 4, 5, 6, 7]);
        check!(BeatSource::Flux.marker() == "*");
    }
}
