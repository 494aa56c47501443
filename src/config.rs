//! Configuration parameters for a pipeline run

use crate::arena::DEFAULT_ALIGNMENT;
use crate::error::ConfigError;
use crate::window::WindowType;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Transform length in samples.
pub const FFT_SIZE: usize = 1024;

/// Number of non-negative frequency bins produced for [`FFT_SIZE`].
pub const SPECTRUM_BINS: usize = FFT_SIZE / 2 + 1;

/// Size of a canonical uncompressed RIFF/WAVE header.
pub const WAV_HEADER_LEN: u64 = 44;

/// Largest accepted per-bin size estimate. A `%.6f` line of any finite
/// `f32` is under 64 bytes.
pub const MAX_BYTES_PER_BIN: u64 = 1024;

/// Bytes that must be free to persist `bins` lines at `bytes_per_bin` each.
///
/// Saturates at `u64::MAX`, which no store can satisfy.
pub fn required_bytes(bytes_per_bin: u64, bins: usize) -> u64 {
    u64::try_from(bins)
        .ok()
        .and_then(|bins| bytes_per_bin.checked_mul(bins))
        .unwrap_or(u64::MAX)
}

/// How the loader treats the container header of the source recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPolicy {
    /// Skip [`WAV_HEADER_LEN`] bytes without looking at them.
    #[default]
    Skip,
    /// Parse the header and require mono 16-bit integer PCM. The rate
    /// check uses `sample_rate` when set, otherwise the pipeline's nominal
    /// rate.
    Validate { sample_rate: Option<u32> },
}

impl HeaderPolicy {
    /// Fill in the expected rate of a `Validate` policy that names none.
    pub fn with_default_rate(self, rate: u32) -> Self {
        match self {
            HeaderPolicy::Validate { sample_rate: None } => HeaderPolicy::Validate {
                sample_rate: Some(rate),
            },
            other => other,
        }
    }
}

/// Conversion applied to each 16-bit sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleScaling {
    /// Divide by 32768, mapping into [-1, 1).
    #[default]
    Normalized,
    /// Keep the integer magnitude.
    Raw,
}

impl SampleScaling {
    pub fn convert(self, sample: i16) -> f32 {
        match self {
            SampleScaling::Normalized => sample as f32 / 32768.0,
            SampleScaling::Raw => sample as f32,
        }
    }
}

/// Amplitude convention of the magnitude spectrum.
///
/// Exactly one convention applies; combining window-energy normalisation
/// with 1/sqrt(N) scaling attenuates twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumScaling {
    /// Divide windowed samples by the window's L2 norm.
    #[default]
    WindowEnergy,
    /// Multiply magnitudes by 1/sqrt(N).
    Orthonormal,
    /// Plain |X[k]|.
    Unscaled,
}

/// Pipeline configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // Store layout
    /// Source recording name inside the store (default: "audio.wav")
    pub input_name: String,

    /// Spectrum table name inside the store (default: "spectrogram.txt")
    pub output_name: String,

    /// Files that space reclamation never deletes, in addition to
    /// `input_name` (default: ["audio.wav"])
    pub keep_files: Vec<String>,

    // Storage guard
    /// Free-space ratio below which cleanup starts (default: 0.2)
    pub min_free_ratio: f64,

    /// Estimated table bytes per bin, for the pre-write space check (default: 20)
    pub bytes_per_bin: u64,

    /// Entries with longer names are skipped during cleanup (default: 128)
    pub max_name_len: usize,

    /// Joined store paths longer than this are skipped during cleanup (default: 512)
    pub max_path_len: usize,

    // Buffers
    /// Start-address alignment of large buffers in bytes (default: 16)
    pub alignment: usize,

    /// Optional cap on live buffer bytes for one run
    pub heap_limit: Option<usize>,

    // Loader
    pub header: HeaderPolicy,
    pub sample_scaling: SampleScaling,

    /// Nominal sample rate of the recording in Hz, used for header
    /// validation and peak frequency reporting (default: 16000)
    pub sample_rate: u32,

    // Analyzer
    pub window: WindowType,
    pub scaling: SpectrumScaling,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_name: "audio.wav".to_string(),
            output_name: "spectrogram.txt".to_string(),
            keep_files: vec!["audio.wav".to_string()],
            min_free_ratio: 0.2,
            bytes_per_bin: 20,
            max_name_len: 128,
            max_path_len: 512,
            alignment: DEFAULT_ALIGNMENT,
            heap_limit: None,
            header: HeaderPolicy::Skip,
            sample_scaling: SampleScaling::Normalized,
            sample_rate: 16_000,
            window: WindowType::Hann,
            scaling: SpectrumScaling::WindowEnergy,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.alignment.is_power_of_two() {
            return Err(ConfigError::InvalidParameter {
                name: "alignment",
                value: self.alignment.to_string(),
                reason: "must be a power of two",
            });
        }
        if !(0.0..1.0).contains(&self.min_free_ratio) {
            return Err(ConfigError::InvalidParameter {
                name: "min_free_ratio",
                value: self.min_free_ratio.to_string(),
                reason: "must be in [0, 1)",
            });
        }
        if self.bytes_per_bin == 0 || self.bytes_per_bin > MAX_BYTES_PER_BIN {
            return Err(ConfigError::InvalidParameter {
                name: "bytes_per_bin",
                value: self.bytes_per_bin.to_string(),
                reason: "must be in 1..=1024",
            });
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "sample_rate",
                value: "0".to_string(),
                reason: "must be > 0",
            });
        }
        if self.input_name.is_empty() || self.output_name.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "input_name/output_name",
                value: String::new(),
                reason: "must not be empty",
            });
        }
        Ok(())
    }

    /// Bytes the result writer requires to be free before writing.
    pub fn required_output_bytes(&self) -> u64 {
        required_bytes(self.bytes_per_bin, SPECTRUM_BINS)
    }
}
