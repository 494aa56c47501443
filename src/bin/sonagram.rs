//! Run one spectrum acquisition over a directory store.
//!
//! Set `RUST_LOG=info` to see stage progress.

use clap::Parser;
use log::{error, info};
use sonagram::store::DirStore;
use sonagram::window::WindowType;
use sonagram::{Pipeline, PipelineConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the recording and receiving the table
    #[arg(default_value = ".")]
    store_dir: PathBuf,

    /// Store capacity in bytes
    #[arg(long, default_value_t = 1 << 20)]
    capacity: u64,

    /// Analysis window (hann or hamming); overrides the config file
    #[arg(long, value_parser = parse_window)]
    window: Option<WindowType>,

    /// JSON pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_window(name: &str) -> Result<WindowType, String> {
    WindowType::parse(name).ok_or_else(|| format!("unknown window `{name}`"))
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match PipelineConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Cannot load {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => PipelineConfig::default(),
    };
    if let Some(window) = cli.window {
        config.window = window;
    }

    info!(
        "Store {} ({} bytes), window {}",
        cli.store_dir.display(),
        cli.capacity,
        config.window.name()
    );
    let store = DirStore::new(cli.store_dir, cli.capacity);
    let mut pipeline = match Pipeline::new(config, store) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match pipeline.run() {
        Ok(report) => {
            info!(
                "Wrote {} bins ({} bytes), peak at {:.1} Hz, transform took {} ns",
                report.bins,
                report.bytes_written,
                report.peak_hz.unwrap_or(0.0),
                report.elapsed_ticks
            );
            ExitCode::SUCCESS
        }
        // already logged by the pipeline
        Err(_) => ExitCode::FAILURE,
    }
}
