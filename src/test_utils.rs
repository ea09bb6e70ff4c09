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

use crate::util::{i16_sample_to_f32, interleaved_to_mono};
use core::time::Duration;
use std::io::Cursor;

/// Compares two timestamps with a tolerance of one microsecond, which
/// absorbs the rounding of `f64` seconds to nanoseconds.
pub fn durations_approx_eq(a: Duration, b: Duration) -> bool {
    a.max(b) - a.min(b) < Duration::from_micros(1)
}

/// Synthetic frames with a precisely known spectrum.
pub mod signals {
    use super::*;
    use core::f32::consts::PI;

    /// A frame of silence.
    pub fn silence(frame_size: usize) -> Vec<f32> {
        vec![0.0; frame_size]
    }

    /// A frame whose first sample is `amplitude`. Its spectrum is flat: every
    /// bin has a magnitude of `amplitude`.
    pub fn impulse(frame_size: usize, amplitude: f32) -> Vec<f32> {
        let mut frame = silence(frame_size);
        frame[0] = amplitude;
        frame
    }

    /// A cosine that completes exactly `bin` periods per frame, so that the
    /// unscaled FFT has `magnitude` in bin `bin` (and its mirror) and
    /// (almost) nothing elsewhere.
    pub fn cosine_at_bin(frame_size: usize, bin: usize, magnitude: f32) -> Vec<f32> {
        let amplitude = 2.0 * magnitude / frame_size as f32;
        (0..frame_size)
            .map(|n| {
                // reduce the phase first to keep f32 precision for high bins
                let phase = ((bin * n) % frame_size) as f32 / frame_size as f32;
                amplitude * (2.0 * PI * phase).cos()
            })
            .collect()
    }

    /// Sum of several [`cosine_at_bin`] signals.
    pub fn cosines_at_bins(frame_size: usize, bins: &[(usize, f32)]) -> Vec<f32> {
        bins.iter()
            .map(|&(bin, magnitude)| cosine_at_bin(frame_size, bin, magnitude))
            .fold(silence(frame_size), |mut acc, frame| {
                acc.iter_mut().zip(frame).for_each(|(a, b)| *a += b);
                acc
            })
    }
}

/// Encodes interleaved samples as a 16-bit PCM WAV file in memory.
pub fn write_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
    for &sample in samples {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
    bytes
}

/// Reads a 16-bit WAV file to mono audio. Additionally, it returns the
/// header of the file.
pub fn read_wav_to_mono(bytes: &[u8]) -> (Vec<f32>, hound::WavSpec) {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    let header = reader.spec();

    let data = reader
        .samples::<i16>()
        .map(|s| i16_sample_to_f32(s.unwrap()))
        .collect::<Vec<_>>();
    let data = data
        .chunks_exact(header.channels as usize)
        .map(interleaved_to_mono)
        .collect();
    (data, header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BeatDetector, DetectorConfig, FrameBuffer, FrequencyBand};
    use assert2::check;

    #[test]
    fn bass_hit_in_a_stereo_wav() {
        const FRAME_SIZE: usize = 1024;

        // 20 frames of silence, one bass hit at 215 Hz, 9 frames of silence
        let mut mono = Vec::new();
        mono.extend(signals::silence(FRAME_SIZE * 20));
        mono.extend(signals::cosine_at_bin(FRAME_SIZE, 5, 100.0));
        mono.extend(signals::silence(FRAME_SIZE * 9));
        let stereo = mono.iter().flat_map(|&s| [s, s]).collect::<Vec<_>>();

        let (samples, header) = read_wav_to_mono(&write_wav(&stereo, 44100, 2));
        check!(header.channels == 2);
        check!(header.sample_rate == 44100);
        check!(samples.len() == FRAME_SIZE * 30);

        let config = DetectorConfig::new(header.sample_rate, FRAME_SIZE);
        let frame_duration = config.frame_duration();
        let mut detector = BeatDetector::new(config).unwrap();
        let mut events = Vec::new();
        FrameBuffer::new(FRAME_SIZE)
            .feed(&samples, |frame| {
                events.extend(detector.process(frame)?);
                Ok::<_, crate::FrameError>(())
            })
            .unwrap();

        check!(events.len() == 1);
        check!(events[0].band() == Some(FrequencyBand::Bass));
        check!(durations_approx_eq(events[0].timestamp(), frame_duration * 20));
    }
}
