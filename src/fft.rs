use crate::error::TransformError;
use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Forward complex transform capability used by the spectral analyzer.
///
/// Mirrors the shape of a hardware DSP kernel: a one-time `init` for a given
/// length, an in-place `forward` pass, and a separate `reorder` pass that
/// brings the output into natural frequency order. Implementations whose
/// forward pass already produces natural order make `reorder` a no-op.
pub trait SpectralTransform {
    /// Prepare the kernel for transforms of length `len`.
    ///
    /// Calling `init` again with the same length must be a cheap no-op.
    fn init(&mut self, len: usize) -> Result<(), TransformError>;

    /// Length the kernel was initialised for, if any.
    fn size(&self) -> Option<usize>;

    /// In-place forward transform of `buffer`.
    fn forward(&mut self, buffer: &mut [Complex32]) -> Result<(), TransformError>;

    /// In-place reordering of the forward output into natural order.
    fn reorder(&mut self, buffer: &mut [Complex32]) -> Result<(), TransformError>;
}

fn check_len(expected: Option<usize>, got: usize) -> Result<usize, TransformError> {
    let expected = expected.ok_or(TransformError::NotInitialised)?;
    if expected != got {
        return Err(TransformError::LengthMismatch { expected, got });
    }
    Ok(expected)
}

/// Portable transform backed by `rustfft`.
///
/// Accepts any non-zero length; output is already in natural order.
///
/// # Example
/// ```
/// use sonagram::fft::{RustFftTransform, SpectralTransform};
/// use num_complex::Complex32;
///
/// let mut fft = RustFftTransform::new();
/// fft.init(512).unwrap();
/// let mut buffer = vec![Complex32::new(1.0, 0.0); 512];
/// fft.forward(&mut buffer).unwrap();
/// fft.reorder(&mut buffer).unwrap();
/// assert!((buffer[0].re - 512.0).abs() < 1e-3);
/// ```
#[derive(Default)]
pub struct RustFftTransform {
    forward: Option<Arc<dyn Fft<f32>>>,
    len: Option<usize>,
}

impl RustFftTransform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpectralTransform for RustFftTransform {
    fn init(&mut self, len: usize) -> Result<(), TransformError> {
        if len == 0 {
            return Err(TransformError::UnsupportedLength(len));
        }
        if self.len == Some(len) {
            return Ok(());
        }
        let mut planner = FftPlanner::new();
        self.forward = Some(planner.plan_fft_forward(len));
        self.len = Some(len);
        Ok(())
    }

    fn size(&self) -> Option<usize> {
        self.len
    }

    fn forward(&mut self, buffer: &mut [Complex32]) -> Result<(), TransformError> {
        check_len(self.len, buffer.len())?;
        let fft = self.forward.as_ref().ok_or(TransformError::NotInitialised)?;
        fft.process(buffer);
        Ok(())
    }

    fn reorder(&mut self, buffer: &mut [Complex32]) -> Result<(), TransformError> {
        check_len(self.len, buffer.len())?;
        Ok(())
    }
}

/// In-place radix-2 decimation-in-frequency kernel.
///
/// The forward pass leaves its output in bit-reversed order, the same
/// contract as the fixed-point DSP kernels found on microcontrollers, so the
/// analyzer's explicit `reorder` step is exercised. Lengths must be powers of
/// two.
#[derive(Debug, Default, Clone)]
pub struct Radix2Transform {
    twiddles: Vec<Complex32>,
    len: Option<usize>,
}

impl Radix2Transform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpectralTransform for Radix2Transform {
    fn init(&mut self, len: usize) -> Result<(), TransformError> {
        if len == 0 || !len.is_power_of_two() {
            return Err(TransformError::UnsupportedLength(len));
        }
        if self.len == Some(len) {
            return Ok(());
        }
        // twiddles in f64 to keep the f32 table accurate at large lengths
        self.twiddles = (0..len / 2)
            .map(|k| {
                let phase = -2.0 * std::f64::consts::PI * k as f64 / len as f64;
                Complex32::new(phase.cos() as f32, phase.sin() as f32)
            })
            .collect();
        self.len = Some(len);
        Ok(())
    }

    fn size(&self) -> Option<usize> {
        self.len
    }

    fn forward(&mut self, buffer: &mut [Complex32]) -> Result<(), TransformError> {
        let n = check_len(self.len, buffer.len())?;
        let mut span = n / 2;
        let mut stride = 1;
        while span >= 1 {
            for block in buffer.chunks_exact_mut(2 * span) {
                let (lo, hi) = block.split_at_mut(span);
                for (j, (a, b)) in lo.iter_mut().zip(hi.iter_mut()).enumerate() {
                    let sum = *a + *b;
                    let diff = (*a - *b) * self.twiddles[j * stride];
                    *a = sum;
                    *b = diff;
                }
            }
            span /= 2;
            stride *= 2;
        }
        Ok(())
    }

    fn reorder(&mut self, buffer: &mut [Complex32]) -> Result<(), TransformError> {
        check_len(self.len, buffer.len())?;
        bit_reverse(buffer);
        Ok(())
    }
}

/// Permute a power-of-two length buffer into bit-reversed index order.
///
/// The permutation is its own inverse.
fn bit_reverse<T>(buffer: &mut [T]) {
    let n = buffer.len();
    debug_assert!(
        n == 0 || n.is_power_of_two(),
        "bit reversal needs a power-of-two length, got {n}"
    );
    if n <= 2 {
        return;
    }
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            buffer.swap(i, j);
        }
    }
}
