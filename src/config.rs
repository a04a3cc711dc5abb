use std::time::Duration;

use crate::process::{enrich::DEFAULT_WORKERS, retry::RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything a run needs besides the input and output paths.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Maximum lookups in flight.
    pub workers: usize,
    pub retry: RetryPolicy,
    /// PubChem root; REST paths are appended to it.
    pub base_url: String,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
    pub user_agent: String,
    pub progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            retry: RetryPolicy::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            progress: true,
        }
    }
}
