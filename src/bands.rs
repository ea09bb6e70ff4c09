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

//! The seven perceptual frequency bands and their mapping to FFT bins.

use crate::spectrum::{bin_freq, Spectrum};
use core::fmt::{Display, Formatter};
use core::ops::{Range, RangeInclusive};

/// A perceptual frequency band. The ranges are closed intervals, so
/// neighbouring bands share their boundary frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrequencyBand {
    /// 20 Hz to 60 Hz.
    SubBass,
    /// 60 Hz to 250 Hz.
    Bass,
    /// 250 Hz to 500 Hz.
    LowMidrange,
    /// 500 Hz to 2 kHz.
    Midrange,
    /// 2 kHz to 4 kHz.
    UpperMidrange,
    /// 4 kHz to 6 kHz.
    Presence,
    /// 6 kHz to 20 kHz.
    Brilliance,
}

impl FrequencyBand {
    /// All bands, ordered from low to high frequencies.
    pub const ALL: [Self; 7] = [
        Self::SubBass,
        Self::Bass,
        Self::LowMidrange,
        Self::Midrange,
        Self::UpperMidrange,
        Self::Presence,
        Self::Brilliance,
    ];

    /// The closed frequency interval of the band in Hz.
    #[must_use]
    pub const fn range_hz(self) -> RangeInclusive<f64> {
        match self {
            Self::SubBass => 20.0..=60.0,
            Self::Bass => 60.0..=250.0,
            Self::LowMidrange => 250.0..=500.0,
            Self::Midrange => 500.0..=2000.0,
            Self::UpperMidrange => 2000.0..=4000.0,
            Self::Presence => 4000.0..=6000.0,
            Self::Brilliance => 6000.0..=20000.0,
        }
    }

    /// Human-readable identifier, such as `"bass"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SubBass => "sub-bass",
            Self::Bass => "bass",
            Self::LowMidrange => "low-mid",
            Self::Midrange => "mid",
            Self::UpperMidrange => "upper-mid",
            Self::Presence => "presence",
            Self::Brilliance => "brilliance",
        }
    }
}

impl Display for FrequencyBand {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// The FFT bins a [`FrequencyBand`] reads its value from.
///
/// With coarse bin resolutions (small frames, high sampling rates) no bin
/// may fall into a narrow band. Such a band degrades to the single bin
/// nearest to its centre. Bands that start at or above the Nyquist
/// frequency can't be observed at all and are [`BandBins::Unavailable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BandBins {
    /// All bins whose frequency lies in the band.
    Range(Range<usize>),
    /// No bin lies in the band, the nearest one stands in for it.
    Nearest(usize),
    /// The band is above the Nyquist frequency.
    Unavailable,
}

impl BandBins {
    /// Maps `band` to the bins of a frame of `frame_size` samples. Only the
    /// bins below the Nyquist frequency are considered.
    pub fn for_band(band: FrequencyBand, sample_rate_hz: u32, frame_size: usize) -> Self {
        let range = band.range_hz();
        let usable = frame_size / 2;
        let nyquist = sample_rate_hz as f64 / 2.0;

        // Bin frequencies grow monotonically, so the matches are contiguous.
        let mut matches =
            (0..usable).filter(|&i| range.contains(&bin_freq(i, sample_rate_hz, frame_size)));
        if let Some(first) = matches.next() {
            let last = matches.last().unwrap_or(first);
            return Self::Range(first..last + 1);
        }

        if *range.start() >= nyquist || usable == 0 {
            log::warn!(
                "Band {band} ({:?} Hz) is above the Nyquist frequency of {nyquist} Hz; no beats will be detected in it",
                range
            );
            return Self::Unavailable;
        }

        let resolution = sample_rate_hz as f64 / frame_size as f64;
        let centre = (range.start() + range.end()) / 2.0;
        let nearest = ((centre / resolution).round() as usize).min(usable - 1);
        log::warn!(
            "Band {band} ({:?} Hz) is narrower than the bin resolution of {resolution} Hz; using bin {nearest} ({} Hz) instead",
            range,
            bin_freq(nearest, sample_rate_hz, frame_size)
        );
        Self::Nearest(nearest)
    }

    /// Current value of the band: the maximum magnitude of its bins.
    /// Returns `None` for [`BandBins::Unavailable`].
    #[must_use]
    pub fn value(&self, spectrum: &Spectrum) -> Option<f64> {
        match self {
            Self::Range(range) => range
                .clone()
                .map(|i| spectrum.magnitude(i))
                .reduce(f32::max)
                .map(f64::from),
            Self::Nearest(index) => Some(f64::from(spectrum.magnitude(*index))),
            Self::Unavailable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::signals;
    use crate::SpectrumAnalyzer;
    use assert2::check;

    #[test]
    fn canonical_mapping_at_44100_1024() {
        // bin resolution: 43.07 Hz
        let bins = FrequencyBand::ALL.map(|band| BandBins::for_band(band, 44100, 1024));
        check!(
            bins == [
                BandBins::Range(1..2),
                BandBins::Range(2..6),
                BandBins::Range(6..12),
                BandBins::Range(12..47),
                BandBins::Range(47..93),
                BandBins::Range(93..140),
                BandBins::Range(140..465),
            ]
        );
    }

    #[test]
    fn canonical_mapping_at_44100_2048() {
        // bin resolution: 21.53 Hz
        check!(BandBins::for_band(FrequencyBand::SubBass, 44100, 2048) == BandBins::Range(1..3));
        check!(BandBins::for_band(FrequencyBand::Bass, 44100, 2048) == BandBins::Range(3..12));
    }

    #[test]
    fn narrow_band_degrades_to_nearest_bin() {
        // bin resolution: 172.27 Hz, so no bin lies between 20 and 60 Hz.
        check!(BandBins::for_band(FrequencyBand::SubBass, 44100, 256) == BandBins::Nearest(0));
        check!(BandBins::for_band(FrequencyBand::Bass, 44100, 256) == BandBins::Range(1..2));
    }

    #[test]
    fn band_above_nyquist_is_unavailable() {
        check!(BandBins::for_band(FrequencyBand::Brilliance, 8000, 1024) == BandBins::Unavailable);
        check!(BandBins::for_band(FrequencyBand::Presence, 8000, 1024) == BandBins::Unavailable);
        check!(matches!(
            BandBins::for_band(FrequencyBand::UpperMidrange, 8000, 1024),
            BandBins::Range(_)
        ));
    }

    #[test]
    fn value_is_the_maximum_magnitude() {
        let mut analyzer = SpectrumAnalyzer::new(44100, 1024);
        let frame = signals::cosines_at_bins(1024, &[(3, 40.0), (5, 100.0), (20, 70.0)]);
        let spectrum = analyzer.analyze(&frame).unwrap();

        let bass = BandBins::for_band(FrequencyBand::Bass, 44100, 1024)
            .value(&spectrum)
            .unwrap();
        check!(float_cmp::approx_eq!(f64, bass, 100.0, epsilon = 1e-2));

        let mid = BandBins::for_band(FrequencyBand::Midrange, 44100, 1024)
            .value(&spectrum)
            .unwrap();
        check!(float_cmp::approx_eq!(f64, mid, 70.0, epsilon = 1e-2));

        check!(BandBins::Unavailable.value(&spectrum) == None);
    }

    #[test]
    fn names() {
        let names = FrequencyBand::ALL.map(FrequencyBand::name);
        check!(
            names
                == [
                    "sub-bass",
                    "bass",
                    "low-mid",
                    "mid",
                    "upper-mid",
                    "presence",
                    "brilliance"
                ]
        );
        check!(format!("{}", FrequencyBand::Bass) == "bass");
    }
}
