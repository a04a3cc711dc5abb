pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod process;

pub use error::{InputError, OutputError, PipelineError};
pub use process::{run, Enricher, KeyColumn, Lookup, Outcome, Table, SENTINEL};
