//! The error type shared by every fallible operation in the crate.

use std::{error::Error, fmt::Display, path::PathBuf};

/// Everything that can go wrong while starting or running the instrument.
#[derive(Debug)]
pub enum HarmoniumError {
    #[allow(missing_docs)]
    IOError(std::io::Error),
    /// A sample file could not be decoded as WAV.
    WavError(hound::Error),
    /// A sample file that the note map depends on could not be opened.
    MissingAsset(PathBuf, std::io::Error),
    /// A sample file was found but does not contain any audio.
    EmptyAsset(PathBuf),
    /// An in-memory sample with no frames, by its index in the bank.
    EmptySample(usize),
    /// The RON config file could not be parsed.
    ConfigError(ron::error::SpannedError),
    #[allow(missing_docs)]
    ConfigWriteError(ron::Error),
    /// Settings that parse but make no sense together.
    InvalidConfig(String),
    #[allow(missing_docs)]
    NoOutputDevice,
    #[allow(missing_docs)]
    AudioConfigError(cpal::DefaultStreamConfigError),
    #[allow(missing_docs)]
    AudioBuildError(cpal::BuildStreamError),
    #[allow(missing_docs)]
    AudioPlayError(cpal::PlayStreamError),
    /// The sensor query ran but did not succeed.
    SensorError(String),
    /// A background thread panicked before it could be joined.
    JoinError,
}

impl Display for HarmoniumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAsset(path, e) => {
                write!(f, "could not open sample {}: {}", path.display(), e)
            }
            Self::EmptyAsset(path) => write!(f, "sample {} has no audio", path.display()),
            Self::EmptySample(id) => write!(f, "sample {} has no audio", id),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::NoOutputDevice => write!(f, "no audio output device found"),
            Self::SensorError(msg) => write!(f, "sensor query failed: {}", msg),
            other => write!(f, "{:#?}", other),
        }
    }
}

impl Error for HarmoniumError {}

impl From<std::io::Error> for HarmoniumError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl From<hound::Error> for HarmoniumError {
    fn from(value: hound::Error) -> Self {
        Self::WavError(value)
    }
}

impl From<ron::error::SpannedError> for HarmoniumError {
    fn from(value: ron::error::SpannedError) -> Self {
        Self::ConfigError(value)
    }
}

impl From<ron::Error> for HarmoniumError {
    fn from(value: ron::Error) -> Self {
        Self::ConfigWriteError(value)
    }
}

impl From<cpal::DefaultStreamConfigError> for HarmoniumError {
    fn from(value: cpal::DefaultStreamConfigError) -> Self {
        Self::AudioConfigError(value)
    }
}

impl From<cpal::BuildStreamError> for HarmoniumError {
    fn from(value: cpal::BuildStreamError) -> Self {
        Self::AudioBuildError(value)
    }
}

impl From<cpal::PlayStreamError> for HarmoniumError {
    fn from(value: cpal::PlayStreamError) -> Self {
        Self::AudioPlayError(value)
    }
}
