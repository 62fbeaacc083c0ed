//! Preprocessing step: clean the raw loan dataset, encode it, and split it
//! into train/validation/test CSVs for the downstream training and
//! evaluation steps.

pub mod encode;
pub mod split;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::PipelineConfig;
use crate::table::{self, Table, TableError};
use encode::{EncodeError, FittedPreprocessor, LabelEncoder};
use split::{shuffle_rows, split_rows};

/// Identifier column dropped before modeling.
pub const ID_COLUMN: &str = "Loan_ID";
/// Binary status column used as the label.
pub const LABEL_COLUMN: &str = "Loan_Status";
/// Output file name for the training partition.
pub const TRAIN_FILE_NAME: &str = "train.csv";
/// Output file name for the validation partition.
pub const VALIDATION_FILE_NAME: &str = "validation.csv";
/// Output file name for the test partition.
pub const TEST_FILE_NAME: &str = "test.csv";

/// Errors produced by the preprocessing step.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("table error: {0}")]
    Table(#[from] TableError),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

/// Invocation options for the preprocessing step.
#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// Input file name under the configured input directory.
    pub filename: String,
    /// Optional shuffle seed; `None` keeps the shuffle non-reproducible.
    pub seed: Option<u64>,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            filename: "sample.csv".to_string(),
            seed: None,
        }
    }
}

/// What the step produced, for logging and tests.
#[derive(Debug, Clone)]
pub struct PreprocessSummary {
    pub input_rows: usize,
    /// Transformed width including the prepended label column.
    pub output_width: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub test_rows: usize,
    pub train_path: PathBuf,
    pub validation_path: PathBuf,
    pub test_path: PathBuf,
}

/// Run the preprocessing step end to end.
///
/// The encoders are fit on the full dataset before the shuffle/split, so the
/// validation and test partitions leak into the fitted statistics. That
/// matches the behavior of the pipeline this step feeds and is covered by a
/// test rather than corrected here.
pub fn run(
    config: &PipelineConfig,
    options: &PreprocessOptions,
) -> Result<PreprocessSummary, PreprocessError> {
    let input_path = config.input_dir.join(&options.filename);
    tracing::info!("Reading input dataset from {}", input_path.display());
    let mut table = Table::read_csv(&input_path)?;
    let input_rows = table.rows.len();

    table.drop_column(ID_COLUMN)?;
    let labels = table.drop_column(LABEL_COLUMN)?;

    let label_encoder = LabelEncoder::fit(&labels)?;
    tracing::info!("Label classes (encoded in order): {:?}", label_encoder.classes);

    let fitted = FittedPreprocessor::fit(&table)?;
    tracing::info!(
        "Fitted {} feature columns (one-hot over {:?})",
        fitted.output_width(),
        fitted.categorical_columns()
    );
    let features = fitted.transform(&table)?;

    let mut rows = Vec::with_capacity(input_rows);
    for (row_idx, (row, label_cell)) in features.into_iter().zip(&labels).enumerate() {
        let label = match label_cell.as_deref() {
            // LabelEncoder::fit already rejected missing labels.
            Some(value) => label_encoder.transform(value)?,
            None => return Err(EncodeError::MissingLabel { row: row_idx }.into()),
        };
        let mut full = Vec::with_capacity(row.len() + 1);
        full.push(label);
        full.extend(row);
        rows.push(full);
    }

    shuffle_rows(&mut rows, options.seed);
    let split = split_rows(rows);

    let train_path = config.output_dir_train.join(TRAIN_FILE_NAME);
    let validation_path = config.output_dir_validation.join(VALIDATION_FILE_NAME);
    let test_path = config.output_dir_test.join(TEST_FILE_NAME);

    tracing::info!("Saving training dataset to {}", train_path.display());
    table::write_headerless_matrix(&train_path, &split.train)?;
    tracing::info!("Saving validation dataset to {}", validation_path.display());
    table::write_headerless_matrix(&validation_path, &split.validation)?;
    tracing::info!("Saving test dataset to {}", test_path.display());
    table::write_headerless_matrix(&test_path, &split.test)?;

    Ok(PreprocessSummary {
        input_rows,
        output_width: fitted.output_width() + 1,
        train_rows: split.train.len(),
        validation_rows: split.validation.len(),
        test_rows: split.test.len(),
        train_path,
        validation_path,
        test_path,
    })
}
