//! CSV tables with per-column dtype inference.
//!
//! The raw loan dataset arrives as a headered CSV with a mix of numeric,
//! boolean, and free-form string columns. Columns are classified by
//! inspecting every non-missing cell; missing cells are empty strings or the
//! usual NA spellings.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while reading or writing CSV tables.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is empty (expected a header row)")]
    EmptyFile { path: PathBuf },
    #[error("{path} line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("{path} line {line}: unterminated quoted field")]
    UnterminatedQuote { path: PathBuf, line: usize },
    #[error("Column not found: {0}")]
    MissingColumn(String),
    #[error("{path} line {line} column {column}: not a number: {value:?}")]
    NotANumber {
        path: PathBuf,
        line: usize,
        column: usize,
        value: String,
    },
}

/// Inferred column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    /// Every non-missing cell parses as `f64`.
    Numeric,
    /// Every non-missing cell is a true/false literal.
    Bool,
    /// Anything else.
    Categorical,
}

/// In-memory CSV table. `None` cells are missing values.
#[derive(Debug, Clone)]
pub struct Table {
    /// Column names from the header row.
    pub headers: Vec<String>,
    /// Row-major cells; each row has exactly `headers.len()` entries.
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Read a headered CSV file.
    pub fn read_csv(path: &Path) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|source| TableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines().enumerate();

        let headers = match lines.next() {
            Some((_, line)) => {
                let line = line.map_err(|source| TableError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                parse_csv_line(&line).map_err(|_| TableError::UnterminatedQuote {
                    path: path.to_path_buf(),
                    line: 1,
                })?
            }
            None => {
                return Err(TableError::EmptyFile {
                    path: path.to_path_buf(),
                });
            }
        };

        let mut rows = Vec::new();
        for (idx, line) in lines {
            let line = line.map_err(|source| TableError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            if line.is_empty() {
                continue;
            }
            let fields = parse_csv_line(&line).map_err(|_| TableError::UnterminatedQuote {
                path: path.to_path_buf(),
                line: idx + 1,
            })?;
            if fields.len() != headers.len() {
                return Err(TableError::RaggedRow {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    expected: headers.len(),
                    found: fields.len(),
                });
            }
            rows.push(
                fields
                    .into_iter()
                    .map(|cell| if is_missing(&cell) { None } else { Some(cell) })
                    .collect(),
            );
        }
        Ok(Self { headers, rows })
    }

    /// Index of a named column.
    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// Remove a column by name, returning its cells in row order.
    pub fn drop_column(&mut self, name: &str) -> Result<Vec<Option<String>>, TableError> {
        let idx = self.column_index(name)?;
        self.headers.remove(idx);
        Ok(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }

    /// Borrowed cells of one column in row order.
    pub fn column(&self, idx: usize) -> Vec<Option<&str>> {
        self.rows
            .iter()
            .map(|row| row[idx].as_deref())
            .collect()
    }

    /// Infer the dtype of a column from its non-missing cells.
    ///
    /// A column with no observed values classifies as Numeric, matching how
    /// an all-NA column lands in a float dtype upstream. A true/false column
    /// is Bool only when it has no missing cells; a missing entry demotes it
    /// to Categorical, the same way NA forces an object dtype upstream.
    pub fn dtype(&self, idx: usize) -> Dtype {
        let mut saw_value = false;
        let mut all_numeric = true;
        let mut all_bool = true;
        for row in &self.rows {
            let Some(cell) = row[idx].as_deref() else {
                all_bool = false;
                continue;
            };
            saw_value = true;
            if cell.trim().parse::<f64>().is_err() {
                all_numeric = false;
            }
            if !is_bool_literal(cell) {
                all_bool = false;
            }
            if !all_numeric && !all_bool {
                return Dtype::Categorical;
            }
        }
        if !saw_value || all_numeric {
            Dtype::Numeric
        } else {
            Dtype::Bool
        }
    }
}

/// Read a headerless all-numeric CSV into a row-major matrix.
///
/// Every row must match the width of the first; a ragged row is rejected the
/// same way it would be under a header.
pub fn read_headerless_matrix(path: &Path) -> Result<Vec<Vec<f64>>, TableError> {
    let file = File::open(path).map_err(|source| TableError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| TableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if line.is_empty() {
            continue;
        }
        let mut row = Vec::new();
        for (col, cell) in line.split(',').enumerate() {
            let value = cell.trim().parse::<f64>().map_err(|_| TableError::NotANumber {
                path: path.to_path_buf(),
                line: idx + 1,
                column: col,
                value: cell.to_string(),
            })?;
            row.push(value);
        }
        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(TableError::RaggedRow {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    expected: first.len(),
                    found: row.len(),
                });
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Write a row-major matrix as a headerless CSV, creating parent dirs.
pub fn write_headerless_matrix(path: &Path, rows: &[Vec<f64>]) -> Result<(), TableError> {
    let map_err = |source: std::io::Error| TableError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(map_err)?;
    }
    let file = File::create(path).map_err(map_err)?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        let mut first = true;
        for value in row {
            if !first {
                write!(writer, ",").map_err(map_err)?;
            }
            write!(writer, "{value}").map_err(map_err)?;
            first = false;
        }
        writeln!(writer).map_err(map_err)?;
    }
    writer.flush().map_err(map_err)?;
    Ok(())
}

/// True when a cell counts as a missing value.
pub fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
}

fn is_bool_literal(cell: &str) -> bool {
    matches!(cell.trim(), "true" | "false" | "True" | "False" | "TRUE" | "FALSE")
}

/// Split one CSV line into fields, honoring double-quoted cells.
fn parse_csv_line(line: &str) -> Result<Vec<String>, ()> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        current.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => current.push(ch),
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => {
                    fields.push(std::mem::take(&mut current));
                }
                _ => current.push(ch),
            }
        }
    }
    if in_quotes {
        return Err(());
    }
    fields.push(current);
    Ok(fields)
}
