// src/process/lookup.rs

use async_trait::async_trait;
use std::collections::HashMap;

/// Marker written into every derived cell that has no real data, and read
/// back from input rows that were already marked unresolved.
pub const SENTINEL: &str = "xxxxxx";

/// Derived values for one row, keyed by output column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Empty values are dropped so that they render as
    /// the sentinel.
    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.values.insert(column.to_string(), value);
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// What a single call to the collaborator produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Found(Record),
    NotFound,
    /// Server busy or rate limited; worth another try.
    Retryable(String),
    /// Anything else that went wrong. Never retried.
    Terminal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    NotFound,
    Failed(String),
    Exhausted { attempts: u32 },
}

/// Final state of a row after the retry policy has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Key was the sentinel or a placeholder; no call was made.
    Skipped,
    Found(Record),
    Unresolved(Reason),
}

impl Outcome {
    /// Render the outcome for one derived column. This is the only place the
    /// tri-state collapses onto the sentinel string.
    pub fn cell(&self, column: &str) -> String {
        match self {
            Outcome::Found(record) => record.get(column).unwrap_or(SENTINEL).to_string(),
            Outcome::Skipped | Outcome::Unresolved(_) => SENTINEL.to_string(),
        }
    }
}

/// An external source that maps a key onto derived columns.
#[async_trait]
pub trait Lookup: Send + Sync {
    /// Derived columns in output order.
    fn columns(&self) -> &[&'static str];

    /// Name of the input column the key is read from.
    fn key_column(&self) -> &str;

    /// Extra markers that flag a key as a placeholder. The sentinel itself is
    /// always a placeholder.
    fn is_placeholder(&self, _key: &str) -> bool {
        false
    }

    async fn lookup(&self, key: &str) -> Attempt;
}

/// True when a row with this key must bypass the collaborator.
pub fn should_skip(lookup: &dyn Lookup, key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || key == SENTINEL || lookup.is_placeholder(key)
}
