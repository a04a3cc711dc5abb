use std::path::PathBuf;
use thiserror::Error;

/// Problems with the input table. Fatal: the run stops before any lookup.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("input file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("input file '{}' is empty or missing headers", .0.display())]
    Empty(PathBuf),

    #[error("input file '{}' must contain a '{column}' column", .path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error(
        "input file '{}' line {line} has {fields} fields but the header has {columns}",
        .path.display()
    )]
    RowTooWide {
        line: u64,
        fields: usize,
        columns: usize,
        path: PathBuf,
    },

    #[error("reading input CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("reading input file: {0}")]
    Io(#[from] std::io::Error),
}

/// Problems writing the result table.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("writing output file: {0}")]
    Io(#[from] std::io::Error),

    #[error("writing output CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("building HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
