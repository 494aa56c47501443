//! Single Window Example
//!
//! This example records a two-tone signal into a scratch store, runs the
//! pipeline once, and reads the captured console stream back.

use log::info;
use sonagram::capture::{read_stream, read_table};
use sonagram::store::DirStore;
use sonagram::{io, Pipeline, PipelineConfig};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

#[derive(Clone, Default)]
struct Capture(Rc<RefCell<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn main() {
    env_logger::init();
    info!("Single Window Example");

    // Record 1024 samples of 750 Hz + 3 kHz at 16 kHz
    let sr = 16000;
    let low = io::tone(750.0, sr, 1024);
    let high = io::tone(3000.0, sr, 1024);
    let mixture: Vec<f32> = low
        .iter()
        .zip(high.iter())
        .map(|(a, b)| 0.6 * a + 0.2 * b)
        .collect();

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("audio.wav"),
        io::pcm16_wav_bytes(&io::quantize_pcm16(&mixture), sr),
    )
    .unwrap();
    info!("Recording written to {}", dir.path().display());

    // Run the pipeline
    let console = Capture::default();
    let mut pipeline = Pipeline::new(PipelineConfig::default(), DirStore::new(dir.path(), 1 << 20))
        .unwrap()
        .with_console(Box::new(console.clone()));
    let report = pipeline.run().unwrap();
    info!("Bins: {}", report.bins);
    info!("Table size: {} bytes", report.bytes_written);
    info!(
        "Peak: bin {:?} ({:.1} Hz)",
        report.peak_bin,
        report.peak_hz.unwrap_or(0.0)
    );

    // Read back both copies
    let table = read_table(dir.path().join("spectrogram.txt")).unwrap();
    let streamed = read_stream(console.0.borrow().as_slice()).unwrap();
    info!(
        "Table and console agree: {}",
        table.len() == streamed.len() && table.iter().zip(&streamed).all(|(a, b)| a == b)
    );
}
