//! Recording helpers: test-tone generation and 16-bit PCM WAV encoding.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("hound error: {0}")]
    Hound(#[from] hound::Error),
}

/// Generate `n_samples` of a unit-amplitude sine at `frequency` Hz.
pub fn tone(frequency: f32, sr: u32, n_samples: usize) -> Vec<f32> {
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sr as f32;
    (0..n_samples)
        .map(|i| (angular_freq * i as f32).sin())
        .collect()
}

/// Quantize samples in [-1.0, 1.0] to signed 16-bit PCM.
///
/// Values outside the range are clipped.
pub fn quantize_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

fn pcm16_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Save mono 16-bit PCM samples to a WAV file.
///
/// # Errors
/// Returns `AudioError::Hound` if the file cannot be written
pub fn save_wav<P: AsRef<Path>>(
    path: P,
    samples: &[i16],
    sample_rate: u32,
) -> Result<(), AudioError> {
    let mut writer = WavWriter::create(path, pcm16_spec(sample_rate))?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Encode mono 16-bit PCM samples as an in-memory WAV image with the
/// canonical 44-byte header.
pub fn pcm16_wav_bytes(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let byte_rate = sample_rate * 2;
    let mut out = Vec::with_capacity(44 + samples.len() * 2);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone() {
        let y = tone(1000.0, 16000, 16);
        assert_eq!(y.len(), 16);
        assert!(y[0].abs() < 1e-6);
        // 16 samples per cycle: quarter period is the peak
        assert!((y[4] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_quantize_clips() {
        assert_eq!(quantize_pcm16(&[0.0, 1.0, -1.0, 2.0, -3.0]), vec![0, 32767, -32767, 32767, -32767]);
    }

    #[test]
    fn test_header_layout() {
        let bytes = pcm16_wav_bytes(&[1, -2, 3], 16000);
        assert_eq!(bytes.len(), 44 + 6);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(&bytes[44..46], &1i16.to_le_bytes());
        assert_eq!(&bytes[46..48], &(-2i16).to_le_bytes());
    }

    #[test]
    fn test_hound_reads_manual_header() {
        let bytes = pcm16_wav_bytes(&[5, -7, 9, 11], 8000);
        let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec(), pcm16_spec(8000));
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![5, -7, 9, 11]);
    }

    #[test]
    fn test_save_wav_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.wav");
        save_wav(&path, &[3, -4, 5], 16000).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec(), pcm16_spec(16000));
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![3, -4, 5]);
    }
}
