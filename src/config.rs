use crate::types::DEFAULT_TOP_N;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Parser)]
#[command(name = "cobenefit_dashboard")]
#[command(about = "Interactive terminal dashboard for small-area co-benefit scores")]
pub struct Args {
    /// Semicolon-delimited dataset to load
    #[arg(short, long, default_value = "Level_1.csv")]
    pub file: PathBuf,

    /// Initial number of areas in the comparison views
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Quiet period before a burst of selection changes is recomputed
    #[arg(long, default_value_t = 150)]
    pub debounce_ms: u64,

    /// Directory for CSV/JSON exports
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Load the dataset at start-up
    #[arg(long)]
    pub load: bool,

    /// Debug logging (RUST_LOG still wins when set)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Logs go to stderr so they never interleave with the menu on stdout.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
