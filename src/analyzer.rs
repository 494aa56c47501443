//! Spectral analyzer: window, transform and magnitude spectrum of one
//! signal window.

use crate::arena::{AlignedBuffer, Arena};
use crate::config::{SpectrumScaling, FFT_SIZE, SPECTRUM_BINS};
use crate::counter::CycleCounter;
use crate::error::{AnalysisError, ArenaError};
use crate::fft::SpectralTransform;
use crate::loader::SignalBuffer;
use crate::window::{self, WindowType};
use log::{debug, info};
use num_complex::Complex32;

/// Magnitude spectrum of one window: [`SPECTRUM_BINS`] non-negative values.
#[derive(Debug)]
pub struct SpectrumBuffer {
    magnitudes: AlignedBuffer<f32>,
    elapsed_ticks: u64,
}

impl SpectrumBuffer {
    /// Wrap precomputed magnitudes, e.g. to re-persist a captured spectrum.
    pub fn from_magnitudes(arena: &Arena, magnitudes: &[f32]) -> Result<Self, ArenaError> {
        let mut buffer = arena.alloc::<f32>(magnitudes.len())?;
        buffer.copy_from_slice(magnitudes);
        Ok(Self {
            magnitudes: buffer,
            elapsed_ticks: 0,
        })
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.magnitudes
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Counter ticks spent in the forward transform and reorder pass.
    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    /// Index of the largest magnitude, `None` for an empty spectrum.
    pub fn peak_bin(&self) -> Option<usize> {
        self.magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }

    /// Smallest and largest magnitude.
    pub fn range(&self) -> (f32, f32) {
        self.magnitudes
            .iter()
            .fold((f32::INFINITY, 0.0f32), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

/// Frequency in Hz at the centre of `bin` for a window of [`FFT_SIZE`] samples.
pub fn bin_frequency(bin: usize, sample_rate: u32) -> f32 {
    bin as f32 * sample_rate as f32 / FFT_SIZE as f32
}

/// Computes magnitude spectra through a [`SpectralTransform`].
pub struct SpectralAnalyzer<T, C> {
    arena: Arena,
    transform: T,
    counter: C,
    window: WindowType,
    scaling: SpectrumScaling,
}

impl<T: SpectralTransform, C: CycleCounter> SpectralAnalyzer<T, C> {
    pub fn new(
        arena: Arena,
        transform: T,
        counter: C,
        window: WindowType,
        scaling: SpectrumScaling,
    ) -> Self {
        Self {
            arena,
            transform,
            counter,
            window,
            scaling,
        }
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// Compute the magnitude spectrum of `signal`.
    ///
    /// The window is applied, the transform runs in place over an aligned
    /// complex scratch buffer followed by the reorder pass, and the
    /// magnitude of each non-negative frequency bin is taken. The scratch
    /// buffer and window are released before returning.
    ///
    /// # Errors
    /// * [`AnalysisError::InvalidInput`] if `signal` is not [`FFT_SIZE`] long
    /// * [`AnalysisError::AllocFailed`] if the arena refuses a buffer
    /// * [`AnalysisError::TransformFailed`] if init, forward or reorder fails
    pub fn analyze(&mut self, signal: &SignalBuffer) -> Result<SpectrumBuffer, AnalysisError> {
        info!("Generating spectrum ({} window)", self.window.name());
        if signal.len() != FFT_SIZE {
            return Err(AnalysisError::InvalidInput {
                expected: FFT_SIZE,
                got: signal.len(),
            });
        }

        self.transform.init(FFT_SIZE)?;

        let mut magnitudes = self.arena.alloc::<f32>(SPECTRUM_BINS)?;
        let mut scratch = self.arena.alloc::<Complex32>(FFT_SIZE)?;

        let coefficients = window::get_window(self.window, FFT_SIZE);
        let gain = match self.scaling {
            SpectrumScaling::WindowEnergy => {
                let norm = window::l2_norm(&coefficients);
                if norm > 0.0 {
                    1.0 / norm
                } else {
                    1.0
                }
            }
            SpectrumScaling::Orthonormal | SpectrumScaling::Unscaled => 1.0,
        };
        debug!("Window gain {:.6}", gain);

        for ((slot, &x), &w) in scratch
            .iter_mut()
            .zip(signal.as_slice())
            .zip(coefficients.iter())
        {
            *slot = Complex32::new(x * w * gain, 0.0);
        }
        drop(coefficients);

        let start = self.counter.now();
        self.transform.forward(&mut scratch)?;
        self.transform.reorder(&mut scratch)?;
        let end = self.counter.now();

        let scale = match self.scaling {
            SpectrumScaling::Orthonormal => 1.0 / (FFT_SIZE as f32).sqrt(),
            SpectrumScaling::WindowEnergy | SpectrumScaling::Unscaled => 1.0,
        };
        for (dst, bin) in magnitudes.iter_mut().zip(scratch.iter()) {
            *dst = bin.norm() * scale;
        }
        drop(scratch);

        let spectrum = SpectrumBuffer {
            magnitudes,
            elapsed_ticks: end.saturating_sub(start),
        };
        let (min, max) = spectrum.range();
        info!("Spectrum range: min={:.6}, max={:.6}", min, max);
        info!("Transform took {} ticks", spectrum.elapsed_ticks);
        Ok(spectrum)
    }
}
