//! One end-to-end run: guard the store, load a window of samples, analyze
//! it, and persist the spectrum.

use crate::analyzer::{bin_frequency, SpectralAnalyzer, SpectrumBuffer};
use crate::arena::Arena;
use crate::config::PipelineConfig;
use crate::counter::{CycleCounter, InstantCounter};
use crate::error::{ConfigError, Result};
use crate::fft::{RustFftTransform, SpectralTransform};
use crate::guard::{GuardPolicy, StorageGuard};
use crate::loader::{SampleLoader, SignalBuffer};
use crate::store::{Quota, Store};
use crate::writer::ResultWriter;
use log::{debug, error, info};
use std::io::{self, Write};

/// Summary of a successful run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    /// Store quota after the storage guard ran.
    pub quota: Quota,
    /// Number of spectrum bins written.
    pub bins: usize,
    /// Size of the persisted table.
    pub bytes_written: u64,
    /// Counter ticks spent in the transform and reorder passes.
    pub elapsed_ticks: u64,
    /// Bin with the largest magnitude.
    pub peak_bin: Option<usize>,
    /// Centre frequency of `peak_bin` at the configured sample rate.
    pub peak_hz: Option<f32>,
}

/// Sequential spectrum acquisition pipeline over a [`Store`].
///
/// Buffers are drawn from one [`Arena`] per pipeline and held in per-run
/// slots that [`Pipeline::cleanup`] empties on every exit path.
pub struct Pipeline<S, T, C> {
    config: PipelineConfig,
    store: S,
    arena: Arena,
    analyzer: SpectralAnalyzer<T, C>,
    console: Box<dyn Write>,
    signal: Option<SignalBuffer>,
    spectrum: Option<SpectrumBuffer>,
}

impl<S: Store> Pipeline<S, RustFftTransform, InstantCounter> {
    /// Pipeline with the portable transform and a wall-clock counter.
    pub fn new(config: PipelineConfig, store: S) -> Result<Self> {
        Self::with_parts(config, store, RustFftTransform::new(), InstantCounter::new())
    }
}

impl<S: Store, T: SpectralTransform, C: CycleCounter> Pipeline<S, T, C> {
    /// Pipeline with an explicit transform kernel and tick source.
    ///
    /// # Errors
    /// [`ConfigError::InvalidParameter`] if `config` does not validate.
    pub fn with_parts(config: PipelineConfig, store: S, transform: T, counter: C) -> Result<Self> {
        config.validate()?;
        let arena = match config.heap_limit {
            Some(limit) => Arena::with_limit(config.alignment, limit),
            None => Arena::new(config.alignment),
        }
        .map_err(|_| ConfigError::InvalidParameter {
            name: "alignment",
            value: config.alignment.to_string(),
            reason: "must be a power of two",
        })?;
        let analyzer =
            SpectralAnalyzer::new(arena.clone(), transform, counter, config.window, config.scaling);
        Ok(Self {
            config,
            store,
            arena,
            analyzer,
            console: Box::new(io::stdout()),
            signal: None,
            spectrum: None,
        })
    }

    /// Replace the console sink (stdout by default).
    pub fn with_console(mut self, console: Box<dyn Write>) -> Self {
        self.console = console;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Run the four stages once.
    ///
    /// Stops at the first failing stage. Buffers acquired so far are
    /// released before returning, whatever the outcome.
    pub fn run(&mut self) -> Result<RunReport> {
        let result = self.run_stages();
        if let Err(e) = &result {
            error!("{} failed: {}", e.stage(), e);
        }
        self.cleanup();
        result
    }

    /// Release any buffers held by the current run. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        self.spectrum = None;
        self.signal = None;
    }

    fn run_stages(&mut self) -> Result<RunReport> {
        self.cleanup();

        let policy = GuardPolicy::from(&self.config);
        let quota = StorageGuard::new(&mut self.store, policy).ensure_space()?;

        debug!(
            "Table needs {} bytes at write time",
            self.config.required_output_bytes()
        );

        let loader = SampleLoader::new(
            self.arena.clone(),
            self.config.header.with_default_rate(self.config.sample_rate),
            self.config.sample_scaling,
        );
        let input = self.store.path(&self.config.input_name);
        let signal = self.signal.insert(loader.load_signal(input)?);

        let spectrum = self.analyzer.analyze(signal)?;
        let spectrum = self.spectrum.insert(spectrum);
        // the time-domain buffer is not needed past this point
        self.signal = None;

        let bytes_written = ResultWriter::new(
            &self.store,
            self.console.as_mut(),
            self.config.bytes_per_bin,
        )
        .write(spectrum, &self.config.output_name)?;

        let peak_bin = spectrum.peak_bin();
        let report = RunReport {
            quota,
            bins: spectrum.len(),
            bytes_written,
            elapsed_ticks: spectrum.elapsed_ticks(),
            peak_bin,
            peak_hz: peak_bin.map(|bin| bin_frequency(bin, self.config.sample_rate)),
        };
        info!(
            "Run complete: {} bins, {} bytes, {} ticks, peak arena usage {} bytes",
            report.bins,
            report.bytes_written,
            report.elapsed_ticks,
            self.arena.peak_bytes()
        );
        Ok(report)
    }
}
