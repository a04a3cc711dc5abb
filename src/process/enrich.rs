// src/process/enrich.rs

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tokio::{sync::Semaphore, task::JoinSet, time::Instant};
use tracing::{error, info, warn};

use super::{
    lookup::{should_skip, Lookup, Outcome, Reason},
    retry::{resolve, RetryPolicy},
    table::Table,
};

pub const DEFAULT_WORKERS: usize = 10;

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub found: usize,
    pub skipped: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Found(_) => self.found += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Unresolved(Reason::NotFound) => self.not_found += 1,
            Outcome::Unresolved(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.found + self.skipped + self.not_found + self.failed
    }
}

/// Maps every row of a table through a `Lookup`, at most `workers` at a time.
pub struct Enricher {
    lookup: Arc<dyn Lookup>,
    policy: RetryPolicy,
    workers: usize,
    progress: bool,
}

impl Enricher {
    pub fn new(lookup: Arc<dyn Lookup>) -> Self {
        Self {
            lookup,
            policy: RetryPolicy::default(),
            workers: DEFAULT_WORKERS,
            progress: false,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Resolve one outcome per row, in input order.
    pub async fn resolve_all(&self, table: &Table) -> Vec<Outcome> {
        let key_column = self.lookup.key_column();
        let key_idx = table.column_index(key_column);
        if key_idx.is_none() {
            warn!(column = key_column, "key column absent; every row is skipped");
        }

        let bar = self.progress_bar(table.len());
        let sem = Arc::new(Semaphore::new(self.workers));
        let mut slots: Vec<Option<Outcome>> = vec![None; table.len()];
        let mut tasks = JoinSet::new();

        for (idx, row) in table.rows().iter().enumerate() {
            let key = key_idx.map(|k| row[k].trim().to_string()).unwrap_or_default();
            if should_skip(self.lookup.as_ref(), &key) {
                slots[idx] = Some(Outcome::Skipped);
                bar.inc(1);
                continue;
            }

            let lookup = Arc::clone(&self.lookup);
            let sem = Arc::clone(&sem);
            let policy = self.policy;
            tasks.spawn(async move {
                // the semaphore is never closed
                let _permit = sem.acquire_owned().await.ok();
                let outcome = resolve(&policy, lookup.as_ref(), &key).await;
                (idx, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, outcome)) => slots[idx] = Some(outcome),
                Err(e) => error!(error = %e, "lookup task failed"),
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| Outcome::Unresolved(Reason::Failed("task aborted".into())))
            })
            .collect()
    }

    /// Produce the enriched copy of `table` together with run counts.
    pub async fn enrich(&self, table: &Table) -> (Table, Summary) {
        let start = Instant::now();
        info!(rows = table.len(), workers = self.workers, "enriching");

        let outcomes = self.resolve_all(table).await;
        let mut summary = Summary::default();
        for outcome in &outcomes {
            summary.record(outcome);
        }

        let enriched = merge(table, self.lookup.columns(), &outcomes);
        info!(
            found = summary.found,
            skipped = summary.skipped,
            not_found = summary.not_found,
            failed = summary.failed,
            elapsed = ?start.elapsed(),
            "enrichment done"
        );
        (enriched, summary)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:40} {pos}/{len} [{elapsed_precise}<{eta}]")
        {
            bar.set_style(style);
        }
        bar
    }
}

/// Copy `table`, appending derived columns that are not already present and
/// filling every derived cell from the row's outcome.
pub fn merge(table: &Table, derived: &[&str], outcomes: &[Outcome]) -> Table {
    let mut headers = table.headers().to_vec();
    for column in derived {
        if !headers.iter().any(|h| h == column) {
            headers.push(column.to_string());
        }
    }
    let positions: Vec<usize> = derived
        .iter()
        .filter_map(|column| headers.iter().position(|h| h == column))
        .collect();

    let rows = table
        .rows()
        .iter()
        .zip(outcomes)
        .map(|(row, outcome)| {
            let mut out = row.clone();
            out.resize(headers.len(), String::new());
            for (column, &pos) in derived.iter().zip(&positions) {
                out[pos] = outcome.cell(column);
            }
            out
        })
        .collect();

    Table::new(headers, rows)
}
