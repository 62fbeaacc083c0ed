//! Fitted column encoders for the preprocessing step.
//!
//! Mirrors the training platform's transform contract: numeric columns are
//! mean-imputed then standardized, categorical columns are most-frequent
//! imputed then one-hot encoded with unknown categories mapping to an
//! all-zero block, and bool columns pass through untouched. Encoders are fit
//! once and applied to every row.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::table::{Dtype, Table};

/// Errors produced while fitting or applying encoders.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Label column has a missing value at row {row}")]
    MissingLabel { row: usize },
    #[error("Label value not seen during fit: {0:?}")]
    UnknownLabel(String),
    #[error("Categorical column {0:?} has no observed values")]
    EmptyColumn(String),
    #[error("Column {column:?} row {row}: not a number: {value:?}")]
    NumericParse {
        column: String,
        row: usize,
        value: String,
    },
    #[error("Column missing from table: {0:?}")]
    MissingColumn(String),
}

/// Integer-encodes a label column with classes in sorted order.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    /// Distinct observed classes, sorted; the encoded value is the index.
    pub classes: Vec<String>,
}

impl LabelEncoder {
    /// Collect the distinct classes of a label column.
    pub fn fit(cells: &[Option<String>]) -> Result<Self, EncodeError> {
        let mut classes = std::collections::BTreeSet::new();
        for (row, cell) in cells.iter().enumerate() {
            let value = cell.as_deref().ok_or(EncodeError::MissingLabel { row })?;
            classes.insert(value.to_string());
        }
        Ok(Self {
            classes: classes.into_iter().collect(),
        })
    }

    /// Encode one label value as its class index.
    pub fn transform(&self, value: &str) -> Result<f64, EncodeError> {
        self.classes
            .iter()
            .position(|class| class == value)
            .map(|idx| idx as f64)
            .ok_or_else(|| EncodeError::UnknownLabel(value.to_string()))
    }
}

/// Mean imputation followed by standardization for one numeric column.
#[derive(Debug, Clone)]
pub struct NumericScaler {
    /// Column mean over non-missing values (the imputation fill).
    pub mean: f64,
    /// Population standard deviation of the imputed column; 1.0 when the
    /// column has no spread.
    pub scale: f64,
}

impl NumericScaler {
    /// Fit mean and scale from a column, missing cells included.
    ///
    /// The scaler fits after imputation, so the variance divisor is the full
    /// row count; imputed cells sit at the mean and contribute zero spread.
    pub fn fit(values: &[Option<f64>]) -> Self {
        let observed: Vec<f64> = values.iter().filter_map(|v| *v).collect();
        if observed.is_empty() {
            return Self { mean: 0.0, scale: 1.0 };
        }
        let mean = observed.iter().sum::<f64>() / observed.len() as f64;
        let variance =
            observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        let std = variance.sqrt();
        let scale = if std == 0.0 { 1.0 } else { std };
        Self { mean, scale }
    }

    /// Impute-and-standardize one cell.
    pub fn transform(&self, value: Option<f64>) -> f64 {
        (value.unwrap_or(self.mean) - self.mean) / self.scale
    }
}

/// Most-frequent imputation followed by one-hot encoding for one column.
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    /// Imputation fill (most frequent value; ties break toward sorted order).
    pub fill: String,
    /// Sorted category list defining the one-hot block layout.
    pub categories: Vec<String>,
}

impl CategoricalEncoder {
    /// Fit categories and the imputation fill from observed cells.
    pub fn fit(name: &str, cells: &[Option<&str>]) -> Result<Self, EncodeError> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for cell in cells.iter().copied().flatten() {
            *counts.entry(cell).or_insert(0) += 1;
        }
        let mut fill: Option<(&str, usize)> = None;
        for (&value, &count) in &counts {
            match fill {
                Some((_, best)) if count <= best => {}
                _ => fill = Some((value, count)),
            }
        }
        let (fill, _) = fill.ok_or_else(|| EncodeError::EmptyColumn(name.to_string()))?;
        Ok(Self {
            fill: fill.to_string(),
            categories: counts.keys().map(|value| value.to_string()).collect(),
        })
    }

    /// One-hot width of this column.
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Encode one cell as a one-hot block.
    ///
    /// Categories not seen during fit produce an all-zero block rather than
    /// an error.
    pub fn transform(&self, cell: Option<&str>) -> Vec<f64> {
        let value = cell.unwrap_or(&self.fill);
        let mut block = vec![0.0; self.categories.len()];
        if let Some(idx) = self.categories.iter().position(|cat| cat == value) {
            block[idx] = 1.0;
        }
        block
    }
}

#[derive(Debug, Clone)]
struct NumericColumn {
    name: String,
    scaler: NumericScaler,
}

#[derive(Debug, Clone)]
struct CategoricalColumn {
    name: String,
    encoder: CategoricalEncoder,
}

/// Column transforms fitted against a feature table.
///
/// Output layout follows the fitted order: standardized numerics first (in
/// original column order), one-hot blocks next (original column order,
/// categories sorted), passthrough bool columns last.
#[derive(Debug, Clone)]
pub struct FittedPreprocessor {
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
    passthrough: Vec<String>,
}

impl FittedPreprocessor {
    /// Fit all column encoders against a feature table.
    pub fn fit(table: &Table) -> Result<Self, EncodeError> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        let mut passthrough = Vec::new();
        for (idx, name) in table.headers.iter().enumerate() {
            match table.dtype(idx) {
                Dtype::Numeric => {
                    let values = parse_numeric_column(table, idx, name)?;
                    numeric.push(NumericColumn {
                        name: name.clone(),
                        scaler: NumericScaler::fit(&values),
                    });
                }
                Dtype::Categorical => {
                    let cells = table.column(idx);
                    categorical.push(CategoricalColumn {
                        name: name.clone(),
                        encoder: CategoricalEncoder::fit(name, &cells)?,
                    });
                }
                Dtype::Bool => passthrough.push(name.clone()),
            }
        }
        Ok(Self {
            numeric,
            categorical,
            passthrough,
        })
    }

    /// Width of a transformed row.
    pub fn output_width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|col| col.encoder.width())
                .sum::<usize>()
            + self.passthrough.len()
    }

    /// Names of the categorical columns, in output order.
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.categorical.iter().map(|col| col.name.as_str()).collect()
    }

    /// Transform every row of a table with the fitted encoders.
    pub fn transform(&self, table: &Table) -> Result<Vec<Vec<f64>>, EncodeError> {
        let mut numeric_values = Vec::with_capacity(self.numeric.len());
        for col in &self.numeric {
            let idx = column_index(table, &col.name)?;
            numeric_values.push(parse_numeric_column(table, idx, &col.name)?);
        }
        let mut categorical_cells = Vec::with_capacity(self.categorical.len());
        for col in &self.categorical {
            let idx = column_index(table, &col.name)?;
            categorical_cells.push(table.column(idx));
        }
        let mut passthrough_cells = Vec::with_capacity(self.passthrough.len());
        for name in &self.passthrough {
            let idx = column_index(table, name)?;
            passthrough_cells.push(table.column(idx));
        }

        let mut out = Vec::with_capacity(table.rows.len());
        for row in 0..table.rows.len() {
            let mut features = Vec::with_capacity(self.output_width());
            for (col, values) in self.numeric.iter().zip(&numeric_values) {
                features.push(col.scaler.transform(values[row]));
            }
            for (col, cells) in self.categorical.iter().zip(&categorical_cells) {
                features.extend(col.encoder.transform(cells[row]));
            }
            for cells in &passthrough_cells {
                let value = matches!(cells[row].map(str::trim), Some("true" | "True" | "TRUE"));
                features.push(if value { 1.0 } else { 0.0 });
            }
            out.push(features);
        }
        Ok(out)
    }
}

fn column_index(table: &Table, name: &str) -> Result<usize, EncodeError> {
    table
        .column_index(name)
        .map_err(|_| EncodeError::MissingColumn(name.to_string()))
}

fn parse_numeric_column(
    table: &Table,
    idx: usize,
    name: &str,
) -> Result<Vec<Option<f64>>, EncodeError> {
    let mut values = Vec::with_capacity(table.rows.len());
    for (row, cells) in table.rows.iter().enumerate() {
        match cells[idx].as_deref() {
            None => values.push(None),
            Some(cell) => {
                let value = cell.trim().parse::<f64>().map_err(|_| EncodeError::NumericParse {
                    column: name.to_string(),
                    row,
                    value: cell.to_string(),
                })?;
                values.push(Some(value));
            }
        }
    }
    Ok(values)
}
