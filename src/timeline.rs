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

//! Module for [`Timeline`].

use core::time::Duration;

/// Frame-synchronous clock of a detection engine. Tracks how much audio was
/// processed and when the most recent beat was emitted.
///
/// The elapsed time is derived from the frame counter instead of being
/// accumulated, so it doesn't drift over long sessions.
#[derive(Debug, Clone)]
pub struct Timeline {
    /// Duration of a single frame in seconds.
    frame_duration_secs: f64,
    /// Number of frames that were fully processed.
    frames_processed: u64,
    /// Timestamp of the last beat. `None` until the first beat.
    last_beat: Option<Duration>,
}

impl Timeline {
    /// Creates a timeline for frames of `frame_size` samples.
    ///
    /// # Panics
    /// Panics if `sample_rate_hz` is zero. [`DetectorConfig::validate`]
    /// rejects such configurations before an engine creates its timeline.
    ///
    /// [`DetectorConfig::validate`]: crate::DetectorConfig::validate
    pub fn new(sample_rate_hz: u32, frame_size: usize) -> Self {
        assert!(sample_rate_hz > 0);
        Self {
            frame_duration_secs: frame_size as f64 / sample_rate_hz as f64,
            frames_processed: 0,
            last_beat: None,
        }
    }

    /// Time since the beginning of the session. This is also the timestamp
    /// of the frame that is currently being processed.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.frames_processed as f64 * self.frame_duration_secs)
    }

    /// Number of processed frames.
    #[must_use]
    pub const fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Timestamp of the most recent beat.
    #[must_use]
    pub const fn last_beat(&self) -> Option<Duration> {
        self.last_beat
    }

    /// Whether the current frame is more than `min_gap` after the last beat.
    /// Always true before the first beat.
    #[must_use]
    pub fn gap_satisfied(&self, min_gap: Duration) -> bool {
        self.last_beat
            .map_or(true, |last| self.elapsed().saturating_sub(last) > min_gap)
    }

    /// Records a beat at the current frame.
    pub fn mark_beat(&mut self) {
        let now = self.elapsed();
        self.last_beat = Some(now);
    }

    /// Moves on to the next frame.
    pub fn advance(&mut self) {
        self.frames_processed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    #[should_panic]
    fn zero_sample_rate_panics() {
        let _ = Timeline::new(0, 1024);
    }

    #[test]
    fn elapsed_time_follows_frame_count() {
        // 1/44100 * 1024 == 0.02322s == 23,22ms
        let mut timeline = Timeline::new(44100, 1024);
        check!(timeline.elapsed() == Duration::ZERO);

        timeline.advance();
        check!(timeline.elapsed().as_micros() == 23219);

        for _ in 0..99 {
            timeline.advance();
        }
        check!(timeline.frames_processed() == 100);
        check!(timeline.elapsed().as_millis() == 2321);
    }

    #[test]
    fn elapsed_time_is_monotonic() {
        let mut timeline = Timeline::new(48000, 2048);
        let mut previous = timeline.elapsed();
        for _ in 0..10_000 {
            timeline.advance();
            let now = timeline.elapsed();
            check!(now >= previous);
            previous = now;
        }
    }

    #[test]
    fn minimum_gap() {
        let mut timeline = Timeline::new(44100, 1024);
        let min_gap = Duration::from_millis(200);
        check!(timeline.gap_satisfied(min_gap), "no beat yet");

        timeline.mark_beat();
        check!(timeline.last_beat() == Some(Duration::ZERO));
        check!(!timeline.gap_satisfied(min_gap));

        // 8 frames: 185.8ms
        for _ in 0..8 {
            timeline.advance();
        }
        check!(!timeline.gap_satisfied(min_gap));

        // 9 frames: 209.0ms
        timeline.advance();
        check!(timeline.gap_satisfied(min_gap));
    }
}
