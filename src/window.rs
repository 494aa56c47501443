use serde::{Deserialize, Serialize};

/// Compute a symmetric Hann (raised cosine) window.
///
/// Uses `N - 1` in the denominator so both end points are exactly zero,
/// matching the coefficients used by the analysis stage on the device.
///
/// # Arguments
/// * `n` - Window length
///
/// # Returns
/// Hann window of length `n`
pub fn hann(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }
    let m = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / m).cos()))
        .collect()
}

/// Compute a symmetric Hamming window.
///
/// Same shape as [`hann`] but raised so the end points sit at 0.08, which
/// lowers the first side lobe.
///
/// # Arguments
/// * `n` - Window length
///
/// # Returns
/// Hamming window of length `n`
pub fn hamming(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }
    let m = (n - 1) as f32;
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * std::f32::consts::PI * i as f32 / m).cos())
        .collect()
}

/// Window type specification for [`get_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    #[default]
    Hann,
    Hamming,
}

impl WindowType {
    /// Parse a window type from a string.
    ///
    /// # Arguments
    /// * `name` - Window name (case-insensitive)
    ///
    /// # Returns
    /// Some(WindowType) if recognized, None otherwise
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "hann" | "hanning" => Some(WindowType::Hann),
            "hamming" => Some(WindowType::Hamming),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WindowType::Hann => "hann",
            WindowType::Hamming => "hamming",
        }
    }
}

/// Get a window of the specified type and length.
///
/// # Example
/// ```
/// use sonagram::window::{get_window, WindowType};
///
/// let w = get_window(WindowType::Hamming, 512);
/// assert_eq!(w.len(), 512);
/// ```
pub fn get_window(window: WindowType, n: usize) -> Vec<f32> {
    match window {
        WindowType::Hann => hann(n),
        WindowType::Hamming => hamming(n),
    }
}

/// L2 norm (square root of the energy) of a window.
///
/// Dividing windowed samples by this value makes the window unit-energy.
pub fn l2_norm(window: &[f32]) -> f32 {
    window.iter().map(|w| w * w).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hann_endpoints_and_peak() {
        let w = hann(1024);
        assert_eq!(w.len(), 1024);
        assert_relative_eq!(w[0], 0.0, epsilon = 1e-7);
        assert_relative_eq!(w[1023], 0.0, epsilon = 1e-6);
        assert!(w.iter().all(|&v| (0.0..=1.0).contains(&v)));
        // symmetric window peaks between the two centre samples
        assert!(w[511] > 0.99 && w[512] > 0.99);
    }

    #[test]
    fn test_hann_symmetry() {
        let w = hann(257);
        for i in 0..w.len() / 2 {
            assert_relative_eq!(w[i], w[w.len() - 1 - i], epsilon = 1e-6);
        }
        assert_relative_eq!(w[128], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_hamming_endpoints() {
        let w = hamming(1024);
        assert_relative_eq!(w[0], 0.08, epsilon = 1e-6);
        assert_relative_eq!(w[1023], 0.08, epsilon = 1e-5);
        assert!(w.iter().all(|&v| (0.08 - 1e-5..=1.0).contains(&v)));
    }

    #[test]
    fn test_degenerate_lengths() {
        assert!(hann(0).is_empty());
        assert_eq!(hann(1), vec![1.0]);
        assert!(hamming(0).is_empty());
        assert_eq!(hamming(1), vec![1.0]);
    }

    #[test]
    fn test_parse() {
        assert_eq!(WindowType::parse("HANN"), Some(WindowType::Hann));
        assert_eq!(WindowType::parse("hanning"), Some(WindowType::Hann));
        assert_eq!(WindowType::parse("Hamming"), Some(WindowType::Hamming));
        assert_eq!(WindowType::parse("kaiser"), None);
        assert_eq!(WindowType::parse(WindowType::Hamming.name()), Some(WindowType::Hamming));
    }

    #[test]
    fn test_l2_norm() {
        assert_relative_eq!(l2_norm(&[3.0, 4.0]), 5.0);
        assert_eq!(l2_norm(&[]), 0.0);

        // Hann energy over N points is 3N/8 minus end-point corrections
        let w = hann(1024);
        let n = l2_norm(&w);
        assert_relative_eq!(n * n, 3.0 * 1023.0 / 8.0, max_relative = 1e-3);
    }
}
