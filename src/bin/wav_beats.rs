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

//! Prints the beats of a WAV file, one line per event.
//!
//! ```text
//! $ wav-beats song.wav --strategy both
//! >>      bass @ 0.464s
//! *       onset @ 0.464s
//! ```

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use spectral_beat_detector::util::i16_sample_to_f32;
use spectral_beat_detector::{
    BeatDetector, ConfigError, DetectorConfig, FrameBuffer, FrameError, StrategyKind,
};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read WAV file: {0}")]
    Wav(#[from] hound::Error),
    #[error("WAV file has no channels")]
    NoChannels,
    #[error("invalid detector configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Bands,
    Flux,
    Both,
}

impl StrategyArg {
    fn kinds(self) -> Vec<StrategyKind> {
        match self {
            Self::Bands => vec![StrategyKind::FrequencyBands],
            Self::Flux => vec![StrategyKind::SpectralFlux],
            Self::Both => vec![StrategyKind::FrequencyBands, StrategyKind::SpectralFlux],
        }
    }
}

/// Detects beats in a WAV file.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// WAV file to analyze. Multi-channel audio is downmixed to mono.
    file: PathBuf,
    /// Samples per analysis frame, a power of two.
    #[arg(long, default_value_t = 2048)]
    frame_size: usize,
    /// Detection strategy.
    #[arg(long, value_enum, default_value_t = StrategyArg::Bands)]
    strategy: StrategyArg,
    /// Band beat threshold relative to the running maximum.
    #[arg(long)]
    beat_threshold: Option<f64>,
    /// Band reset threshold relative to the running maximum.
    #[arg(long)]
    reset_threshold: Option<f64>,
    /// Threshold for the smoothed spectral flux.
    #[arg(long)]
    flux_threshold: Option<f32>,
    /// Minimum gap between two flux onsets in milliseconds.
    #[arg(long)]
    min_gap_ms: Option<u64>,
    /// Log debug output to stderr.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn detector_config(&self, sample_rate_hz: u32) -> DetectorConfig {
        let mut config =
            DetectorConfig::new(sample_rate_hz, self.frame_size).with_strategies(self.strategy.kinds());
        if let Some(beat_threshold) = self.beat_threshold {
            config = config.with_beat_threshold(beat_threshold);
        }
        if let Some(reset_threshold) = self.reset_threshold {
            config = config.with_reset_threshold(reset_threshold);
        }
        if let Some(flux_threshold) = self.flux_threshold {
            config = config.with_flux_threshold(flux_threshold);
        }
        if let Some(min_gap_ms) = self.min_gap_ms {
            config = config.with_min_gap(Duration::from_millis(min_gap_ms));
        }
        config
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(level)
        .with_colors(true)
        .init()
    {
        eprintln!("failed to initialize logger: {e}");
    }
}

/// Reads all samples as `f32` in range `-1.0..=1.0`, still interleaved.
fn read_samples(
    reader: hound::WavReader<std::io::BufReader<std::fs::File>>,
) -> Result<Vec<f32>, hound::Error> {
    let spec = reader.spec();
    match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, _) => reader.into_samples::<f32>().collect(),
        (hound::SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .map(|sample| sample.map(i16_sample_to_f32))
            .collect(),
        (hound::SampleFormat::Int, bits) => {
            let scale = (1_i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|sample| sample.map(|sample| sample as f32 / scale))
                .collect()
        }
    }
}

fn run(args: &Args) -> Result<usize, CliError> {
    let reader = hound::WavReader::open(&args.file)?;
    let spec = reader.spec();
    let channels = NonZeroUsize::new(spec.channels as usize).ok_or(CliError::NoChannels)?;
    log::debug!("{}: {:?}", args.file.display(), spec);

    let mut detector = BeatDetector::new(args.detector_config(spec.sample_rate))?;
    let samples = read_samples(reader)?;

    let mut beats = 0;
    let mut frames = FrameBuffer::with_channels(args.frame_size, channels);
    frames.feed(&samples, |frame| {
        for event in detector.process(frame)? {
            println!("{:<8}{event}", event.source().marker());
            beats += 1;
        }
        Ok::<_, CliError>(())
    })?;

    if frames.pending() > 0 {
        log::debug!(
            "Ignored {} trailing samples that don't fill a frame",
            frames.pending()
        );
    }
    Ok(beats)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.verbose);

    match run(&args) {
        Ok(beats) => {
            log::debug!("Found {beats} beats");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
