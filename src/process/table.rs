// src/process/table.rs

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::error::{InputError, OutputError};

/// Header given to the only column of a headerless input.
pub const HEADERLESS_COLUMN: &str = "Name";

/// How the key column is located in the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyColumn {
    /// The file has a header row which must contain this column.
    Named(String),
    /// No header row; the first field of every record is the key.
    Headerless,
}

impl KeyColumn {
    pub fn named(column: &str) -> Self {
        KeyColumn::Named(column.to_string())
    }

    pub fn header(&self) -> &str {
        match self {
            KeyColumn::Named(name) => name,
            KeyColumn::Headerless => HEADERLESS_COLUMN,
        }
    }
}

/// An in-memory CSV table. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Read the whole file into memory and check the key column is present.
    pub fn load(path: impl AsRef<Path>, key: &KeyColumn) -> Result<Self, InputError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(InputError::NotFound(path.to_path_buf()));
        }
        if fs::metadata(path)?.len() == 0 {
            return Err(InputError::Empty(path.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(matches!(key, KeyColumn::Named(_)))
            .flexible(true)
            .from_path(path)?;

        let table = match key {
            KeyColumn::Named(column) => {
                let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
                if headers.iter().all(|h| h.trim().is_empty()) {
                    return Err(InputError::Empty(path.to_path_buf()));
                }
                if !headers.iter().any(|h| h == column) {
                    return Err(InputError::MissingColumn {
                        column: column.clone(),
                        path: path.to_path_buf(),
                    });
                }
                let mut rows = Vec::new();
                for record in reader.records() {
                    let record = record?;
                    if record.len() > headers.len() {
                        return Err(InputError::RowTooWide {
                            line: record.position().map(|p| p.line()).unwrap_or_default(),
                            fields: record.len(),
                            columns: headers.len(),
                            path: path.to_path_buf(),
                        });
                    }
                    rows.push(record.iter().map(str::to_string).collect());
                }
                Table::new(headers, rows)
            }
            KeyColumn::Headerless => {
                let mut rows = Vec::new();
                // blank lines never reach here; a blank first field is kept
                // and later rendered as unresolved
                for record in reader.records() {
                    let record = record?;
                    rows.push(vec![record.get(0).unwrap_or_default().to_string()]);
                }
                if rows.is_empty() {
                    return Err(InputError::Empty(path.to_path_buf()));
                }
                Table::new(vec![HEADERLESS_COLUMN.to_string()], rows)
            }
        };

        info!(path = %path.display(), rows = table.len(), "loaded input");
        Ok(table)
    }

    /// Write to a temporary sibling first, then rename into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), OutputError> {
        let path = path.as_ref();
        let tmp_path = tmp_sibling(path);

        let result = self.write_csv(&tmp_path);
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!(path = %path.display(), rows = self.len(), "saved output");
        Ok(())
    }

    fn write_csv(&self, path: &Path) -> Result<(), OutputError> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Value of `column` in row `row`, if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "output.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}
