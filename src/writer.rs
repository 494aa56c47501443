//! Result writer: persist a spectrum as a text table and mirror it to a
//! live console stream.

use crate::analyzer::SpectrumBuffer;
use crate::config::required_bytes;
use crate::error::WriteError;
use crate::store::Store;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{self, Write};

/// Line opening one run's spectrum on the console stream.
pub const START_SENTINEL: &str = "===SPECTROGRAM_START===";

/// Line closing one run's spectrum on the console stream.
pub const END_SENTINEL: &str = "===SPECTROGRAM_END===";

/// Format one magnitude as a table line.
pub fn format_line(magnitude: f32) -> String {
    format!("{magnitude:.6}\n")
}

/// Writes spectra into a [`Store`] and echoes them to `console`.
pub struct ResultWriter<'a, S: Store> {
    store: &'a S,
    console: &'a mut dyn Write,
    bytes_per_bin: u64,
}

impl<'a, S: Store> ResultWriter<'a, S> {
    pub fn new(store: &'a S, console: &'a mut dyn Write, bytes_per_bin: u64) -> Self {
        Self {
            store,
            console,
            bytes_per_bin,
        }
    }

    /// Persist `spectrum` as entry `name`, one `%.6f` line per bin.
    ///
    /// Each line goes to the console first, then to the file, which is
    /// flushed after every line so a partial table survives an interrupted
    /// run. The console copy is wrapped in [`START_SENTINEL`] and
    /// [`END_SENTINEL`].
    ///
    /// # Returns
    /// Size of the written file in bytes.
    ///
    /// # Errors
    /// * [`WriteError::InfoUnavailable`] if capacity cannot be queried
    /// * [`WriteError::InsufficientSpace`] if the estimated size exceeds free space
    /// * [`WriteError::Io`] on any write or flush failure; remaining lines are dropped
    /// * [`WriteError::VerificationFailed`] if the closed file is missing or empty
    pub fn write(&mut self, spectrum: &SpectrumBuffer, name: &str) -> Result<u64, WriteError> {
        info!("Saving spectrum to {}", name);

        let quota = self.store.quota().map_err(WriteError::InfoUnavailable)?;
        let free = quota.free();
        let required = required_bytes(self.bytes_per_bin, spectrum.len());
        info!(
            "Store: total {} bytes, used {} bytes, free {} bytes, required {} bytes",
            quota.total, quota.used, free, required
        );
        if free < required {
            return Err(WriteError::InsufficientSpace { required, free });
        }

        let path = self.store.path(name);
        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed previous {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(WriteError::Io(e)),
        }

        let mut file = File::create(&path)?;
        write!(self.console, "\n{START_SENTINEL}\n")?;
        for &magnitude in spectrum.as_slice() {
            let line = format_line(magnitude);
            self.console.write_all(line.as_bytes())?;
            file.write_all(line.as_bytes())?;
            file.flush()?;
        }
        writeln!(self.console, "{END_SENTINEL}")?;
        self.console.flush()?;
        file.sync_all()?;
        drop(file);

        let size = match fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                return Err(WriteError::VerificationFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };
        if size == 0 {
            return Err(WriteError::VerificationFailed {
                path: path.display().to_string(),
                reason: "file is empty".to_string(),
            });
        }

        info!("Spectrum saved, file size: {} bytes", size);
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::config::SPECTRUM_BINS;
    use crate::store::DirStore;

    fn mounted_store(dir: &tempfile::TempDir, capacity: u64) -> DirStore {
        let mut store = DirStore::new(dir.path(), capacity);
        store.mount().unwrap();
        store
    }

    /// Console that accepts `budget` bytes, then fails.
    struct BrokenConsole {
        budget: usize,
    }

    impl Write for BrokenConsole {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "console gone"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_zero_spectrum_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = mounted_store(&dir, 1 << 20);
        let arena = Arena::new(16).unwrap();
        let spectrum = SpectrumBuffer::from_magnitudes(&arena, &[0.0; SPECTRUM_BINS]).unwrap();

        let mut console = Vec::new();
        let size = ResultWriter::new(&store, &mut console, 20)
            .write(&spectrum, "spectrogram.txt")
            .unwrap();
        assert_eq!(size, (SPECTRUM_BINS * 9) as u64);

        let text = fs::read_to_string(store.path("spectrogram.txt")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), SPECTRUM_BINS);
        assert!(lines.iter().all(|&l| l == "0.000000"));
        assert!(text.ends_with('\n'));

        let console = String::from_utf8(console).unwrap();
        let mut console_lines = console.lines();
        assert_eq!(console_lines.next(), Some(""));
        assert_eq!(console_lines.next(), Some(START_SENTINEL));
        assert_eq!(console_lines.clone().count(), SPECTRUM_BINS + 1);
        assert_eq!(console_lines.last(), Some(END_SENTINEL));
    }

    #[test]
    fn test_six_decimal_format() {
        assert_eq!(format_line(1.0), "1.000000\n");
        assert_eq!(format_line(0.1234567), "0.123457\n");
        assert_eq!(format_line(1234.5), "1234.500000\n");
    }

    #[test]
    fn test_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = mounted_store(&dir, 1 << 20);
        fs::write(store.path("out.txt"), "stale\n".repeat(1000)).unwrap();
        let arena = Arena::new(16).unwrap();
        let spectrum = SpectrumBuffer::from_magnitudes(&arena, &[1.5, 2.25]).unwrap();

        let mut console = Vec::new();
        ResultWriter::new(&store, &mut console, 20)
            .write(&spectrum, "out.txt")
            .unwrap();
        assert_eq!(
            fs::read_to_string(store.path("out.txt")).unwrap(),
            "1.500000\n2.250000\n"
        );
    }

    #[test]
    fn test_insufficient_space() {
        let dir = tempfile::tempdir().unwrap();
        let store = mounted_store(&dir, 10_000);
        let arena = Arena::new(16).unwrap();
        let spectrum = SpectrumBuffer::from_magnitudes(&arena, &[0.0; SPECTRUM_BINS]).unwrap();

        let mut console = Vec::new();
        let err = ResultWriter::new(&store, &mut console, 20)
            .write(&spectrum, "spectrogram.txt")
            .unwrap_err();
        assert!(matches!(
            err,
            WriteError::InsufficientSpace {
                required: 10_260,
                free: 10_000
            }
        ));
        assert!(console.is_empty());
        assert!(!store.path("spectrogram.txt").exists());
    }

    #[test]
    fn test_oversized_estimate_is_insufficient() {
        let dir = tempfile::tempdir().unwrap();
        let store = mounted_store(&dir, 1 << 20);
        let arena = Arena::new(16).unwrap();
        let spectrum = SpectrumBuffer::from_magnitudes(&arena, &[0.0; SPECTRUM_BINS]).unwrap();

        let mut console = Vec::new();
        let err = ResultWriter::new(&store, &mut console, u64::MAX)
            .write(&spectrum, "spectrogram.txt")
            .unwrap_err();
        assert!(matches!(
            err,
            WriteError::InsufficientSpace {
                required: u64::MAX,
                free: 1_048_576
            }
        ));
        assert!(!store.path("spectrogram.txt").exists());
    }

    #[test]
    fn test_info_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path(), 1 << 20);
        let arena = Arena::new(16).unwrap();
        let spectrum = SpectrumBuffer::from_magnitudes(&arena, &[0.0; 4]).unwrap();
        let mut console = Vec::new();
        let err = ResultWriter::new(&store, &mut console, 20)
            .write(&spectrum, "spectrogram.txt")
            .unwrap_err();
        assert!(matches!(err, WriteError::InfoUnavailable(_)));
    }

    #[test]
    fn test_io_error_aborts_remaining_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = mounted_store(&dir, 1 << 20);
        let arena = Arena::new(16).unwrap();
        let spectrum = SpectrumBuffer::from_magnitudes(&arena, &[0.0; 10]).unwrap();

        // sentinel block plus three lines
        let mut console = BrokenConsole {
            budget: START_SENTINEL.len() + 2 + 3 * 9,
        };
        let err = ResultWriter::new(&store, &mut console, 20)
            .write(&spectrum, "spectrogram.txt")
            .unwrap_err();
        assert!(matches!(err, WriteError::Io(_)));
        let text = fs::read_to_string(store.path("spectrogram.txt")).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_empty_table_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let store = mounted_store(&dir, 1 << 20);
        let arena = Arena::new(16).unwrap();
        let spectrum = SpectrumBuffer::from_magnitudes(&arena, &[]).unwrap();
        let mut console = Vec::new();
        let err = ResultWriter::new(&store, &mut console, 20)
            .write(&spectrum, "spectrogram.txt")
            .unwrap_err();
        assert!(matches!(err, WriteError::VerificationFailed { .. }));
    }
}
