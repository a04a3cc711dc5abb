// src/process/mod.rs

use std::path::Path;
use tracing::info;

use crate::error::Result;

pub mod enrich;
pub mod lookup;
pub mod retry;
pub mod table;

pub use enrich::{Enricher, Summary};
pub use lookup::{Attempt, Lookup, Outcome, Reason, Record, SENTINEL};
pub use retry::RetryPolicy;
pub use table::{KeyColumn, Table};

/// Load `input`, enrich every row, write `output`. Nothing is written when
/// the input is rejected.
pub async fn run(
    input: &Path,
    output: &Path,
    key: &KeyColumn,
    enricher: &Enricher,
) -> Result<Summary> {
    let table = Table::load(input, key)?;
    let (enriched, summary) = enricher.enrich(&table).await;
    enriched.save(output)?;
    info!(output = %output.display(), rows = enriched.len(), "wrote output");
    Ok(summary)
}
