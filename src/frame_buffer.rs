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

//! Module for [`FrameBuffer`].

use crate::util::interleaved_to_mono;
use core::num::NonZeroUsize;

/// Cuts audio blocks of arbitrary length into frames of a fixed size.
///
/// Audio sources and devices deliver blocks whose length rarely matches the
/// frame size of the detector. The buffer collects the samples, downmixes
/// interleaved multi-channel audio to mono and hands out every complete
/// frame in order. Incomplete frames wait for the next block.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    frame_size: usize,
    channels: NonZeroUsize,
    /// Samples of an incomplete interleaved group from the previous block.
    partial_group: Vec<f32>,
    /// Mono samples of the next, incomplete frame.
    pending: Vec<f32>,
}

impl FrameBuffer {
    /// Creates a buffer for mono audio.
    ///
    /// # Panics
    /// Panics if `frame_size` is zero.
    pub fn new(frame_size: usize) -> Self {
        Self::with_channels(frame_size, NonZeroUsize::MIN)
    }

    /// Creates a buffer for interleaved audio of `channels` channels, for
    /// example `LRLR` for stereo.
    ///
    /// # Panics
    /// Panics if `frame_size` is zero.
    pub fn with_channels(frame_size: usize, channels: NonZeroUsize) -> Self {
        assert!(frame_size > 0);
        Self {
            frame_size,
            channels,
            partial_group: Vec::with_capacity(channels.get()),
            pending: Vec::with_capacity(frame_size),
        }
    }

    /// Number of mono samples waiting for the next frame.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Appends `block` and calls `on_frame` for every frame that is complete
    /// afterwards. Stops at the first error of `on_frame`; the frame that
    /// caused it is dropped.
    pub fn feed<E>(
        &mut self,
        block: &[f32],
        mut on_frame: impl FnMut(&[f32]) -> Result<(), E>,
    ) -> Result<(), E> {
        let channels = self.channels.get();
        if channels == 1 {
            self.push_mono(block, &mut on_frame)
        } else {
            let mut block = block;
            if !self.partial_group.is_empty() {
                let missing = (channels - self.partial_group.len()).min(block.len());
                self.partial_group.extend_from_slice(&block[..missing]);
                block = &block[missing..];
                if self.partial_group.len() < channels {
                    return Ok(());
                }
                let sample = interleaved_to_mono(&self.partial_group);
                self.partial_group.clear();
                self.push_mono(&[sample], &mut on_frame)?;
            }

            let groups = block.chunks_exact(channels);
            self.partial_group.extend_from_slice(groups.remainder());
            for group in groups {
                self.push_mono(&[interleaved_to_mono(group)], &mut on_frame)?;
            }
            Ok(())
        }
    }

    fn push_mono<E>(
        &mut self,
        mut samples: &[f32],
        on_frame: &mut impl FnMut(&[f32]) -> Result<(), E>,
    ) -> Result<(), E> {
        while !samples.is_empty() {
            let take = (self.frame_size - self.pending.len()).min(samples.len());
            self.pending.extend_from_slice(&samples[..take]);
            samples = &samples[take..];

            if self.pending.len() == self.frame_size {
                let result = on_frame(&self.pending);
                self.pending.clear();
                result?;
            }
        }
        Ok(())
    }
}
