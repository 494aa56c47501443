//! Sample loader: read one analysis window of 16-bit PCM from a recording.

use crate::arena::{AlignedBuffer, Arena};
use crate::config::{HeaderPolicy, SampleScaling, FFT_SIZE, WAV_HEADER_LEN};
use crate::error::{ArenaError, LoadError};
use hound::{SampleFormat, WavReader};
use log::info;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// One window of [`FFT_SIZE`] samples, aligned for the transform stage.
#[derive(Debug)]
pub struct SignalBuffer {
    samples: AlignedBuffer<f32>,
}

impl SignalBuffer {
    /// Copy already-converted samples into an arena buffer.
    ///
    /// Used to analyse synthetic signals without going through a file.
    pub fn from_samples(arena: &Arena, samples: &[f32]) -> Result<Self, ArenaError> {
        let mut buffer = arena.alloc::<f32>(samples.len())?;
        buffer.copy_from_slice(samples);
        Ok(Self { samples: buffer })
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Smallest and largest sample.
    pub fn range(&self) -> (f32, f32) {
        self.samples
            .iter()
            .fold((0.0f32, 0.0f32), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

/// Reads [`FFT_SIZE`] samples from a stored recording.
#[derive(Debug, Clone)]
pub struct SampleLoader {
    arena: Arena,
    header: HeaderPolicy,
    scaling: SampleScaling,
}

impl SampleLoader {
    pub fn new(arena: Arena, header: HeaderPolicy, scaling: SampleScaling) -> Self {
        Self {
            arena,
            header,
            scaling,
        }
    }

    /// Load the first window of samples following the container header.
    ///
    /// # Errors
    /// * [`LoadError::NotFound`] if `path` does not exist
    /// * [`LoadError::AllocFailed`] if the arena refuses a buffer
    /// * [`LoadError::UnsupportedFormat`] if header validation is enabled and fails
    /// * [`LoadError::Truncated`] if fewer than [`FFT_SIZE`] samples follow the header
    pub fn load_signal<P: AsRef<Path>>(&self, path: P) -> Result<SignalBuffer, LoadError> {
        let path = path.as_ref();
        info!("Reading audio data from {}", path.display());

        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound {
                path: path.display().to_string(),
            },
            _ => LoadError::Io(e),
        })?;

        let mut samples = self.arena.alloc::<f32>(FFT_SIZE)?;
        let mut raw = self.arena.alloc::<i16>(FFT_SIZE)?;

        let read = match self.header {
            HeaderPolicy::Skip => read_after_header(file, &mut raw)?,
            HeaderPolicy::Validate { sample_rate } => read_validated(file, sample_rate, &mut raw)?,
        };
        if read < FFT_SIZE {
            return Err(LoadError::Truncated {
                needed: FFT_SIZE,
                read,
            });
        }

        for (dst, &src) in samples.iter_mut().zip(raw.iter()) {
            *dst = self.scaling.convert(src);
        }
        drop(raw);

        let signal = SignalBuffer { samples };
        let (min, max) = signal.range();
        info!("Audio data range: min={:.6}, max={:.6}", min, max);
        Ok(signal)
    }
}

/// Skip the fixed header and read little-endian samples until `raw` is full
/// or the file ends. Returns the number of whole samples read.
fn read_after_header(file: File, raw: &mut [i16]) -> Result<usize, LoadError> {
    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(WAV_HEADER_LEN))?;

    let mut bytes = [0u8; 2];
    let mut read = 0;
    for slot in raw.iter_mut() {
        match reader.read_exact(&mut bytes) {
            Ok(()) => {
                *slot = i16::from_le_bytes(bytes);
                read += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(read)
}

/// Parse the RIFF header, require mono 16-bit integer PCM, then read samples.
fn read_validated(
    file: File,
    expected_rate: Option<u32>,
    raw: &mut [i16],
) -> Result<usize, LoadError> {
    let mut reader = WavReader::new(BufReader::new(file)).map_err(hound_error)?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(LoadError::UnsupportedFormat(format!(
            "expected mono, got {} channels",
            spec.channels
        )));
    }
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(LoadError::UnsupportedFormat(format!(
            "expected 16-bit integer PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }
    if let Some(rate) = expected_rate {
        if spec.sample_rate != rate {
            return Err(LoadError::UnsupportedFormat(format!(
                "expected {} Hz, got {} Hz",
                rate, spec.sample_rate
            )));
        }
    }

    let mut read = 0;
    for (slot, sample) in raw.iter_mut().zip(reader.samples::<i16>()) {
        match sample {
            Ok(s) => {
                *slot = s;
                read += 1;
            }
            Err(hound::Error::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(hound_error(e)),
        }
    }
    Ok(read)
}

fn hound_error(err: hound::Error) -> LoadError {
    match err {
        hound::Error::IoError(e) => LoadError::Io(e),
        other => LoadError::UnsupportedFormat(other.to_string()),
    }
}
