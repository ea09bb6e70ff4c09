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

//! Module for [`SpectrumAnalyzer`], the forward FFT shared by all strategies.

use core::fmt::{Debug, Formatter};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use thiserror::Error;

/// Errors caused by a malformed frame. These are configuration errors of
/// the calling pipeline: the frame is rejected before any state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The frame length doesn't match the configured frame size.
    #[error("frame has {actual} samples but the detector expects {expected}")]
    LengthMismatch {
        /// Configured frame size.
        expected: usize,
        /// Length of the rejected frame.
        actual: usize,
    },
}

/// Returns the frequency in Hz that FFT bin `index` corresponds to.
#[inline]
#[must_use]
pub fn bin_freq(index: usize, sample_rate_hz: u32, frame_size: usize) -> f64 {
    index as f64 * sample_rate_hz as f64 / frame_size as f64
}

/// Unscaled forward FFT of one frame.
///
/// Holds all `N` bins, but only the first `N / 2` are physically
/// meaningful for real input.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    bins: Vec<Complex<f32>>,
    sample_rate_hz: u32,
}

impl Spectrum {
    /// Wraps already transformed bins.
    pub(crate) fn from_bins(bins: Vec<Complex<f32>>, sample_rate_hz: u32) -> Self {
        Self {
            bins,
            sample_rate_hz,
        }
    }

    /// Number of bins, equals the frame size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Whether the spectrum has no bins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Number of bins below the Nyquist frequency.
    #[must_use]
    pub fn usable_len(&self) -> usize {
        self.bins.len() / 2
    }

    /// The complex coefficients.
    #[must_use]
    pub fn bins(&self) -> &[Complex<f32>] {
        &self.bins
    }

    /// Magnitude of bin `index`. Non-finite magnitudes (overflow of very
    /// loud input) count as zero so that they never poison running state.
    #[inline]
    #[must_use]
    pub fn magnitude(&self, index: usize) -> f32 {
        let magnitude = self.bins[index].norm();
        if magnitude.is_finite() {
            magnitude
        } else {
            0.0
        }
    }

    /// Iterates the magnitudes of the bins below Nyquist. The upper half
    /// mirrors them for real input and is skipped.
    pub fn magnitudes(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.usable_len()).map(|i| self.magnitude(i))
    }

    /// Largest magnitude below Nyquist.
    #[must_use]
    pub fn max_magnitude(&self) -> f32 {
        self.magnitudes().fold(0.0, f32::max)
    }

    /// Multiplies every coefficient with `factor`.
    pub fn scale(&mut self, factor: f32) {
        self.bins.iter_mut().for_each(|bin| *bin *= factor);
    }

    /// Frequency of bin `index` in Hz.
    #[must_use]
    pub fn bin_freq(&self, index: usize) -> f64 {
        bin_freq(index, self.sample_rate_hz, self.bins.len())
    }

    /// Frequency of the loudest bin below Nyquist.
    #[must_use]
    pub fn peak_frequency(&self) -> f64 {
        let (index, _) = (0..self.usable_len())
            .map(|i| (i, self.magnitude(i)))
            .fold((0, f32::MIN), |max, item| if item.1 > max.1 { item } else { max });
        self.bin_freq(index)
    }
}

/// Transforms frames into [`Spectrum`]s. The FFT is planned once and reused
/// for every frame. Apart from scratch memory, the analyzer has no state,
/// so every frame is analyzed independently of all previous ones.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    sample_rate_hz: u32,
    frame_size: usize,
}

impl Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("sample_rate_hz", &self.sample_rate_hz)
            .field("frame_size", &self.frame_size)
            .finish_non_exhaustive()
    }
}

impl SpectrumAnalyzer {
    /// Creates a new analyzer for frames of `frame_size` samples.
    pub fn new(sample_rate_hz: u32, frame_size: usize) -> Self {
        let fft = FftPlanner::<f32>::new().plan_fft_forward(frame_size);
        let scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];
        Self {
            fft,
            scratch,
            sample_rate_hz,
            frame_size,
        }
    }

    /// The configured frame size.
    #[must_use]
    pub const fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// The configured sampling rate.
    #[must_use]
    pub const fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Transforms a frame into its unscaled spectrum.
    ///
    /// Non-finite samples are replaced by silence. The frame itself is never
    /// modified.
    pub fn analyze(&mut self, frame: &[f32]) -> Result<Spectrum, FrameError> {
        if frame.len() != self.frame_size {
            return Err(FrameError::LengthMismatch {
                expected: self.frame_size,
                actual: frame.len(),
            });
        }

        let mut non_finite = 0;
        let mut bins = frame
            .iter()
            .map(|&sample| {
                if sample.is_finite() {
                    Complex::new(sample, 0.0)
                } else {
                    non_finite += 1;
                    Complex::default()
                }
            })
            .collect::<Vec<_>>();
        if non_finite > 0 {
            log::warn!("Replaced {non_finite} non-finite samples of the frame with silence");
        }

        self.fft.process_with_scratch(&mut bins, &mut self.scratch);
        Ok(Spectrum::from_bins(bins, self.sample_rate_hz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::signals;
    use assert2::check;
    use float_cmp::approx_eq;

    #[test]
    fn is_send_and_sync() {
        fn accept<I: Send + Sync>() {}

        accept::<SpectrumAnalyzer>();
        accept::<Spectrum>();
    }

    #[test]
    fn bin_frequencies() {
        check!(bin_freq(0, 44100, 1024) == 0.0);
        check!(approx_eq!(f64, bin_freq(1, 44100, 1024), 43.06640625));
        check!(approx_eq!(f64, bin_freq(512, 44100, 1024), 22050.0));
        check!(approx_eq!(f64, bin_freq(1, 44100, 2048), 21.533203125));
    }

    #[test]
    fn rejects_frames_of_wrong_length() {
        let mut analyzer = SpectrumAnalyzer::new(44100, 1024);
        check!(
            analyzer.analyze(&[0.0; 512])
                == Err(FrameError::LengthMismatch {
                    expected: 1024,
                    actual: 512
                })
        );
        check!(analyzer.analyze(&[0.0; 1024]).is_ok());
    }

    #[test]
    fn transform_is_unscaled() {
        let mut analyzer = SpectrumAnalyzer::new(44100, 1024);
        let frame = signals::impulse(1024, 0.5);
        let spectrum = analyzer.analyze(&frame).unwrap();

        check!(spectrum.len() == 1024);
        check!(spectrum.usable_len() == 512);
        // An impulse has a flat spectrum with its amplitude in every bin.
        for magnitude in spectrum.magnitudes() {
            check!(approx_eq!(f32, magnitude, 0.5, epsilon = 1e-5));
        }

        // Magnitude of a cosine that sits exactly on a bin is A * N / 2.
        let frame = signals::cosine_at_bin(1024, 5, 100.0);
        let spectrum = analyzer.analyze(&frame).unwrap();
        check!(approx_eq!(f32, spectrum.magnitude(5), 100.0, epsilon = 1e-2));
        check!(spectrum.magnitude(6) < 1e-2);
        // the mirror image above Nyquist is not part of the usable magnitudes
        check!(approx_eq!(f32, spectrum.magnitude(1019), 100.0, epsilon = 1e-2));
        check!(spectrum.magnitudes().count() == 512);
        check!(approx_eq!(f32, spectrum.max_magnitude(), 100.0, epsilon = 1e-2));
        check!(approx_eq!(
            f64,
            spectrum.peak_frequency(),
            bin_freq(5, 44100, 1024)
        ));
    }

    #[test]
    fn silence_has_no_energy() {
        let mut analyzer = SpectrumAnalyzer::new(44100, 2048);
        let spectrum = analyzer.analyze(&signals::silence(2048)).unwrap();
        check!(spectrum.max_magnitude() == 0.0);
    }

    #[test]
    fn non_finite_samples_are_silenced() {
        let mut analyzer = SpectrumAnalyzer::new(44100, 1024);
        let mut frame = signals::silence(1024);
        frame[3] = f32::NAN;
        frame[7] = f32::INFINITY;
        let spectrum = analyzer.analyze(&frame).unwrap();
        check!(spectrum.magnitudes().all(|m| m == 0.0));
        // the caller's frame is untouched
        check!(frame[3].is_nan());
    }

    #[test]
    fn scale_applies_to_all_bins() {
        let mut analyzer = SpectrumAnalyzer::new(44100, 1024);
        let mut spectrum = analyzer.analyze(&signals::impulse(1024, 0.5)).unwrap();
        spectrum.scale(4.0);
        check!(approx_eq!(f32, spectrum.max_magnitude(), 2.0, epsilon = 1e-5));
    }
}
