//! Host-side readers for the console stream and the persisted table.
//!
//! The console stream is the de facto wire format between a device run and
//! the capture tool: arbitrary log noise, then [`START_SENTINEL`], one
//! magnitude per line, then [`END_SENTINEL`].

use crate::error::CaptureError;
use crate::writer::{END_SENTINEL, START_SENTINEL};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Extract the first sentinel-delimited spectrum from a line stream.
///
/// Lines before the start sentinel are ignored, as are lines inside the
/// block that do not parse as numbers (interleaved log output).
///
/// # Errors
/// * [`CaptureError::StartNotFound`] if the stream has no start sentinel
/// * [`CaptureError::EndNotFound`] if the stream ends inside the block
///
/// # Example
/// ```
/// use sonagram::capture::read_stream;
///
/// let stream = "boot\n===SPECTROGRAM_START===\n0.5\nI (12) noise\n1.25\n===SPECTROGRAM_END===\n";
/// assert_eq!(read_stream(stream.as_bytes()).unwrap(), vec![0.5, 1.25]);
/// ```
pub fn read_stream<R: BufRead>(reader: R) -> Result<Vec<f32>, CaptureError> {
    let mut values = Vec::new();
    let mut started = false;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !started {
            started = line == START_SENTINEL;
            continue;
        }
        if line == END_SENTINEL {
            return Ok(values);
        }
        match line.parse::<f32>() {
            Ok(v) => values.push(v),
            Err(_) => debug!("Ignoring console line: {}", line),
        }
    }
    if started {
        Err(CaptureError::EndNotFound {
            values: values.len(),
        })
    } else {
        Err(CaptureError::StartNotFound)
    }
}

/// Read a persisted spectrum table, one value per line.
///
/// Blank lines are ignored; any other unparsable line is an error.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Vec<f32>, CaptureError> {
    let reader = BufReader::new(File::open(path)?);
    let mut values = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let value = text.parse::<f32>().map_err(|_| CaptureError::Parse {
            line: idx + 1,
            text: text.to_string(),
        })?;
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_with_noise() {
        let stream = format!(
            "I (310) SPECTROGRAM: Saving\n0.9\n\n{START_SENTINEL}\n1.000000\n\nbogus\n2.500000\n{END_SENTINEL}\n3.0\n"
        );
        assert_eq!(read_stream(stream.as_bytes()).unwrap(), vec![1.0, 2.5]);
    }

    #[test]
    fn test_stream_missing_start() {
        let stream = "1.0\n2.0\n";
        assert!(matches!(
            read_stream(stream.as_bytes()),
            Err(CaptureError::StartNotFound)
        ));
    }

    #[test]
    fn test_stream_missing_end() {
        let stream = format!("{START_SENTINEL}\n1.0\n2.0\n");
        assert!(matches!(
            read_stream(stream.as_bytes()),
            Err(CaptureError::EndNotFound { values: 2 })
        ));
    }

    #[test]
    fn test_only_first_block() {
        let stream = format!(
            "{START_SENTINEL}\n1\n{END_SENTINEL}\n{START_SENTINEL}\n2\n{END_SENTINEL}\n"
        );
        assert_eq!(read_stream(stream.as_bytes()).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        std::fs::write(&path, "0.000000\n1.500000\n\n").unwrap();
        assert_eq!(read_table(&path).unwrap(), vec![0.0, 1.5]);

        std::fs::write(&path, "0.1\nnope\n").unwrap();
        assert!(matches!(
            read_table(&path),
            Err(CaptureError::Parse { line: 2, .. })
        ));
    }
}
