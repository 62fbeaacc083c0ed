//! Evaluation step: extract the trained model, score the held-out test
//! partition, and write the metrics report consumed by the pipeline's
//! quality gate.

pub mod archive;
pub mod metrics;
pub mod model;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::preprocess::TEST_FILE_NAME;
use crate::table::{self, TableError};
use metrics::MetricsError;
use model::BoostedModel;

/// Archive file name produced by the training step.
pub const MODEL_ARCHIVE_NAME: &str = "model.tar.gz";
/// Model file name inside the archive.
pub const MODEL_FILE_NAME: &str = "xgboost-model";
/// Report file name.
pub const REPORT_FILE_NAME: &str = "evaluation.json";

/// Errors produced by the evaluation step.
#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error("Failed to extract {path}: {message}")]
    Archive { path: PathBuf, message: String },
    #[error("Failed to load model {path}: {message}")]
    Model { path: PathBuf, message: String },
    #[error("table error: {0}")]
    Table(#[from] TableError),
    #[error("Test partition has no feature columns")]
    NoFeatures,
    #[error("Test rows carry {found} features but the model expects {expected}")]
    FeatureWidth { expected: usize, found: usize },
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("Failed to write report {path}: {source}")]
    WriteReport {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize report: {0}")]
    SerializeReport(#[from] serde_json::Error),
}

/// A single metric value as it appears in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricValue {
    pub value: f64,
}

/// The two metrics the quality gate reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub auc: MetricValue,
    pub f1: MetricValue,
}

/// Report document written to `evaluation.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub classification_metrics: ClassificationMetrics,
}

/// Run the evaluation step end to end.
///
/// Any failure terminates the step without a partial report.
pub fn run(config: &PipelineConfig) -> Result<EvaluationReport, EvaluateError> {
    let archive_path = config.model_dir.join(MODEL_ARCHIVE_NAME);
    tracing::info!("Extracting model from {}", archive_path.display());
    archive::extract_tar_gz(&archive_path, &config.work_dir)?;

    let model_path = config.work_dir.join(MODEL_FILE_NAME);
    tracing::info!("Loading model from {}", model_path.display());
    let model = BoostedModel::load_json(&model_path)?;

    let test_path = config.output_dir_test.join(TEST_FILE_NAME);
    tracing::info!("Loading test partition from {}", test_path.display());
    let rows = table::read_headerless_matrix(&test_path)?;
    if rows.is_empty() {
        return Err(MetricsError::Empty.into());
    }

    let mut raw_labels = Vec::with_capacity(rows.len());
    let mut predictions = Vec::with_capacity(rows.len());
    for row in &rows {
        let (label, features) = row.split_first().ok_or(EvaluateError::NoFeatures)?;
        if features.len() != model.feature_len {
            return Err(EvaluateError::FeatureWidth {
                expected: model.feature_len,
                found: features.len(),
            });
        }
        raw_labels.push(*label);
        predictions.push(model.predict_score(features));
    }
    let labels = metrics::binary_labels(&raw_labels)?;

    let auc = metrics::roc_auc(&labels, &predictions)?;
    // Scores go into the F1 as-is, matching the report's consumers.
    let f1 = metrics::f1_verbatim(&labels, &predictions)?;
    tracing::info!("Computed metrics: auc={auc:.6} f1={f1:.6}");

    let report = EvaluationReport {
        classification_metrics: ClassificationMetrics {
            auc: MetricValue { value: auc },
            f1: MetricValue { value: f1 },
        },
    };

    let report_path = config.evaluation_dir.join(REPORT_FILE_NAME);
    tracing::info!("Saving classification report to {}", report_path.display());
    write_report(&report, &report_path)?;
    Ok(report)
}

fn write_report(report: &EvaluationReport, path: &PathBuf) -> Result<(), EvaluateError> {
    let body = serde_json::to_string(report)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| EvaluateError::WriteReport {
            path: path.clone(),
            source,
        })?;
    }
    std::fs::write(path, body).map_err(|source| EvaluateError::WriteReport {
        path: path.clone(),
        source,
    })
}
