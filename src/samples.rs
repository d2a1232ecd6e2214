//! Loading the note samples with hound.
//!
//! Every sample is mixed down to mono `f32` in `[-1, 1]` at load time, so the
//! audio callback never has to think about file formats.

use crate::{error::HarmoniumError, keyboard::NOTE_MAP};

use hound::{SampleFormat, WavReader};
use log::{debug, info};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Index of a sample inside a [`SampleBank`]. Matches the note's position in
/// [`NOTE_MAP`].
pub type SampleId = usize;

/// A decoded, mono sample.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Mono frames, shared with every voice playing this sample.
    pub frames: Arc<[f32]>,
    /// Frames per second the sample was recorded at.
    pub sample_rate: u32,
}

impl Sample {
    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Decodes one WAV file.
///
/// Integer samples are scaled by their bit depth; multi-channel files are
/// averaged down to one channel.
pub fn load_sample(path: &Path) -> Result<Sample, HarmoniumError> {
    let file = File::open(path).map_err(|e| HarmoniumError::MissingAsset(path.to_owned(), e))?;
    let reader = WavReader::new(BufReader::new(file))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<f32>, hound::Error>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<f32>, hound::Error>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let frames: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    if frames.is_empty() {
        return Err(HarmoniumError::EmptyAsset(path.to_owned()));
    }

    debug!(
        "Loaded {} ({} frames, {} Hz, {} channel(s))",
        path.display(),
        frames.len(),
        spec.sample_rate,
        spec.channels
    );

    Ok(Sample {
        frames: frames.into(),
        sample_rate: spec.sample_rate,
    })
}

/// One decoded sample per entry of [`NOTE_MAP`].
#[derive(Debug, Clone)]
pub struct SampleBank {
    samples: Vec<Sample>,
}

impl SampleBank {
    /// Loads every note sample from `dir`. Fails on the first file that is
    /// missing or unreadable.
    pub fn load(dir: &Path) -> Result<Self, HarmoniumError> {
        let samples = NOTE_MAP
            .iter()
            .map(|b| load_sample(&dir.join(b.file)))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Loaded {} note samples from {}", samples.len(), dir.display());
        Ok(Self { samples })
    }

    /// Builds a bank from samples that are already in memory. Every sample
    /// must have at least one frame.
    pub fn from_samples(samples: Vec<Sample>) -> Result<Self, HarmoniumError> {
        if let Some(id) = samples.iter().position(Sample::is_empty) {
            return Err(HarmoniumError::EmptySample(id));
        }
        Ok(Self { samples })
    }

    #[allow(missing_docs)]
    pub fn get(&self, id: SampleId) -> Option<&Sample> {
        self.samples.get(id)
    }

    #[allow(missing_docs)]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Where each note's sample is expected to live.
    pub fn expected_paths(dir: &Path) -> Vec<PathBuf> {
        NOTE_MAP.iter().map(|b| dir.join(b.file)).collect()
    }
}
