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

//! Some common utilities required internally but also useful for external
//! users, when working with this library.

/// Transforms an audio sample in range `i16::MIN..=i16::MAX` to a `f32` in
/// range `-1.0..=1.0`.
#[inline]
#[must_use]
pub fn i16_sample_to_f32(val: i16) -> f32 {
    // If to prevent division result >1.0.
    if val == i16::MIN {
        -1.0
    } else {
        val as f32 / i16::MAX as f32
    }
}

/// Transforms the samples of all channels that reflect the same point in
/// time (one group of interleaved audio, e.g. `LR`) into one mono sample.
#[inline]
#[must_use]
pub fn interleaved_to_mono(group: &[f32]) -> f32 {
    if group.is_empty() {
        0.0
    } else {
        group.iter().sum::<f32>() / group.len() as f32
    }
}

/// Transforms two stereo samples (that reflect the same point in time on
/// different channels) into one mono sample.
#[inline]
#[must_use]
pub fn stereo_to_mono(l: f32, r: f32) -> f32 {
    interleaved_to_mono(&[l, r])
}
