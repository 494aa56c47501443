use sonagram::analyzer::SpectralAnalyzer;
use sonagram::arena::Arena;
use sonagram::config::{SpectrumScaling, FFT_SIZE, SPECTRUM_BINS};
use sonagram::counter::InstantCounter;
use sonagram::fft::{Radix2Transform, RustFftTransform};
use sonagram::loader::SignalBuffer;
use sonagram::window::WindowType;
use sonagram::writer::format_line;
use proptest::prelude::*;

fn analyzer(arena: &Arena) -> SpectralAnalyzer<RustFftTransform, InstantCounter> {
    SpectralAnalyzer::new(
        arena.clone(),
        RustFftTransform::new(),
        InstantCounter::new(),
        WindowType::Hann,
        SpectrumScaling::WindowEnergy,
    )
}

proptest! {
    #[test]
    fn spectrum_shape_and_sign(samples in prop::collection::vec(any::<i16>(), FFT_SIZE)) {
        let arena = Arena::new(16).unwrap();
        let signal: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
        let signal = SignalBuffer::from_samples(&arena, &signal).unwrap();
        let spectrum = analyzer(&arena).analyze(&signal).unwrap();

        prop_assert_eq!(spectrum.len(), SPECTRUM_BINS);
        prop_assert!(spectrum.as_slice().iter().all(|m| m.is_finite() && *m >= 0.0));
        drop(spectrum);
        drop(signal);
        prop_assert_eq!(arena.live_bytes(), 0);
    }

    #[test]
    fn sinusoid_peaks_at_expected_bin(frequency in 100.0f32..7800.0, amplitude in 0.05f32..1.0) {
        let sample_rate = 16_000u32;
        let arena = Arena::new(16).unwrap();
        let tone: Vec<f32> = sonagram::io::tone(frequency, sample_rate, FFT_SIZE)
            .iter()
            .map(|s| amplitude * s)
            .collect();
        let signal = SignalBuffer::from_samples(&arena, &tone).unwrap();
        let mut analyzer = SpectralAnalyzer::new(
            arena.clone(),
            Radix2Transform::new(),
            InstantCounter::new(),
            WindowType::Hamming,
            SpectrumScaling::Unscaled,
        );
        let peak = analyzer.analyze(&signal).unwrap().peak_bin().unwrap();
        let expected = (frequency * FFT_SIZE as f32 / sample_rate as f32).round() as usize;
        prop_assert!(peak.abs_diff(expected) <= 1, "peak {} expected {}", peak, expected);
    }

    #[test]
    fn table_line_reads_back(magnitude in 0.0f32..1000.0) {
        let line = format_line(magnitude);
        let parsed: f32 = line.trim_end().parse().unwrap();
        prop_assert!((parsed - magnitude).abs() <= 1e-4);
        prop_assert!(line.ends_with('\n'));
    }
}
