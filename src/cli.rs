use clap::Args;
use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};
use tracing::error;

use crate::{
    config::{Settings, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS},
    process::{self, enrich::DEFAULT_WORKERS, Enricher, KeyColumn, Lookup},
};

/// Arguments shared by every enrichment tool.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to the input CSV file
    pub input_file: PathBuf,

    /// Path to the output CSV file
    pub output_file: PathBuf,

    /// Verbose logging; also hides the progress bar
    #[arg(long)]
    pub debug: bool,

    /// Maximum lookups in flight
    #[arg(long, env = "CHEMNAMES_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// PubChem root URL
    #[arg(long, env = "PUBCHEM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl CommonArgs {
    pub fn settings(&self) -> Settings {
        Settings {
            workers: self.workers.max(1),
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            progress: !self.debug,
            ..Settings::default()
        }
    }
}

/// Shared body of the binaries: run the pipeline and map fatal errors onto
/// exit code 1. Logging must already be initialised.
pub async fn run_tool(args: &CommonArgs, key: KeyColumn, lookup: Arc<dyn Lookup>) -> ExitCode {
    let settings = args.settings();
    let enricher = Enricher::new(lookup)
        .with_policy(settings.retry)
        .with_workers(settings.workers)
        .with_progress(settings.progress);

    match process::run(&args.input_file, &args.output_file, &key, &enricher).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
