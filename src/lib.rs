//! Single-window spectrum acquisition and storage for Rust.
//!
//! Sonagram takes one window of 16-bit PCM from a recording kept on a small
//! persistent store, computes its magnitude spectrum, and writes the result
//! back as a text table while mirroring it to a console stream for live
//! capture. It is built for memory- and storage-constrained targets: every
//! large buffer comes from an aligned [`arena::Arena`] with a byte ledger,
//! and the store is checked (and reclaimed if needed) before any work starts.
//!
//! # Quick Start
//!
//! ```rust
//! use sonagram::{io, Pipeline, PipelineConfig};
//! use sonagram::store::DirStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let tone = io::quantize_pcm16(&io::tone(1000.0, 16_000, 1024));
//! std::fs::write(dir.path().join("audio.wav"), io::pcm16_wav_bytes(&tone, 16_000)).unwrap();
//!
//! let store = DirStore::new(dir.path(), 1 << 20);
//! let mut pipeline = Pipeline::new(PipelineConfig::default(), store)
//!     .unwrap()
//!     .with_console(Box::new(std::io::sink()));
//! let report = pipeline.run().unwrap();
//! assert_eq!(report.bins, 513);
//! assert_eq!(report.peak_bin, Some(64)); // 1000 Hz * 1024 / 16000 Hz
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pipeline`] | End-to-end run over a store, with per-run buffer cleanup |
//! | [`guard`] | Free-space check, cleanup and format fallback |
//! | [`loader`] | Fixed-length PCM window reader |
//! | [`analyzer`] | Windowed transform and magnitude spectrum |
//! | [`writer`] | Text table writer with sentinel-delimited console mirror |
//! | [`capture`] | Host-side readers for the console stream and the table |
//! | [`store`] | Store capability and directory-backed implementation |
//! | [`arena`] | Aligned buffer allocation with a byte ledger |
//! | [`fft`] | Transform capability, `rustfft` backend and radix-2 kernel |
//! | [`window`] | Window functions (Hann, Hamming) |
//! | [`counter`] | Tick sources for timing the transform |
//! | [`config`] | Pipeline parameters and JSON loading |
//! | [`io`] | Test-signal generators and PCM WAV writers |
//!
//! # Error Handling
//!
//! Each stage has its own error enum; all convert into the crate-level
//! [`Error`] through [`Result<T>`]. A failing stage ends the run.
//!
//! # Safety
//!
//! This crate uses `#![forbid(unsafe_code)]`.

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, Result};

pub mod analyzer;
pub mod arena;
pub mod capture;
pub mod config;
pub mod counter;
pub mod fft;
pub mod guard;
pub mod io;
pub mod loader;
pub mod pipeline;
pub mod store;
pub mod window;
pub mod writer;

pub use config::PipelineConfig;
pub use pipeline::{Pipeline, RunReport};
