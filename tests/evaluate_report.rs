//! End-to-end scenarios for the evaluation step.

use std::fs::File;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use loanpipe::config::PipelineConfig;
use loanpipe::evaluate::model::{BoostedModel, Stump};
use loanpipe::evaluate::{
    self, EvaluateError, MODEL_ARCHIVE_NAME, MODEL_FILE_NAME, REPORT_FILE_NAME,
};
use tempfile::TempDir;

/// Model whose score rises with feature 0.
fn sample_model() -> BoostedModel {
    BoostedModel {
        model_version: 1,
        feature_len: 2,
        base_score: 0.0,
        learning_rate: 0.5,
        stumps: vec![
            Stump {
                feature_index: 0,
                threshold: 0.0,
                left_value: -6.0,
                right_value: 6.0,
            },
            Stump {
                feature_index: 0,
                threshold: 0.0,
                left_value: -2.0,
                right_value: 2.0,
            },
        ],
    }
}

fn write_model_archive(model_dir: &Path, model: &BoostedModel) {
    std::fs::create_dir_all(model_dir).unwrap();
    let file = File::create(model_dir.join(MODEL_ARCHIVE_NAME)).unwrap();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let body = serde_json::to_vec(model).unwrap();
    let mut header = tar::Header::new_gnu();
    header.set_size(body.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, MODEL_FILE_NAME, body.as_slice())
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap();
}

fn pipeline_config(root: &Path) -> PipelineConfig {
    let config = PipelineConfig {
        model_dir: root.join("model"),
        output_dir_test: root.join("test"),
        evaluation_dir: root.join("evaluation"),
        work_dir: root.join("work"),
        ..PipelineConfig::default()
    };
    std::fs::create_dir_all(&config.output_dir_test).unwrap();
    std::fs::create_dir_all(&config.work_dir).unwrap();
    config
}

#[test]
fn writes_report_with_both_metrics() {
    let dir = TempDir::new().unwrap();
    let config = pipeline_config(dir.path());
    write_model_archive(&config.model_dir, &sample_model());
    // Positives sit above the split threshold, so the ranking is perfect.
    std::fs::write(
        config.output_dir_test.join("test.csv"),
        "1,2.0,0.1\n1,1.5,-0.3\n0,-1.0,0.2\n0,-0.5,0.0\n1,3.0,0.9\n0,-2.0,-0.1\n",
    )
    .unwrap();

    let report = evaluate::run(&config).unwrap();
    assert_eq!(report.classification_metrics.auc.value, 1.0);

    let body = std::fs::read_to_string(config.evaluation_dir.join(REPORT_FILE_NAME)).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    let auc = parsed["classification_metrics"]["auc"]["value"]
        .as_f64()
        .unwrap();
    let f1 = parsed["classification_metrics"]["f1"]["value"]
        .as_f64()
        .unwrap();
    assert!((0.0..=1.0).contains(&auc));
    assert!((0.0..=1.0).contains(&f1));
}

// Scores are sigmoid probabilities that never equal 1.0 exactly, and the F1
// consumes them verbatim with no thresholding, so it reads 0 even for a
// perfect ranking. Known defect in the report contract, preserved on
// purpose; the AUC is unaffected.
#[test]
fn f1_reads_zero_for_probability_scores() {
    let dir = TempDir::new().unwrap();
    let config = pipeline_config(dir.path());
    write_model_archive(&config.model_dir, &sample_model());
    std::fs::write(
        config.output_dir_test.join("test.csv"),
        "1,2.0,0.0\n0,-2.0,0.0\n",
    )
    .unwrap();

    let report = evaluate::run(&config).unwrap();
    assert_eq!(report.classification_metrics.auc.value, 1.0);
    assert_eq!(report.classification_metrics.f1.value, 0.0);
}

// A test partition narrower than the model would otherwise score through
// zero-defaulted features and emit a report that looks healthy.
#[test]
fn narrow_test_rows_terminate_without_report() {
    let dir = TempDir::new().unwrap();
    let config = pipeline_config(dir.path());
    let model = BoostedModel {
        model_version: 1,
        feature_len: 3,
        base_score: 0.0,
        learning_rate: 0.5,
        stumps: vec![Stump {
            feature_index: 2,
            threshold: 0.0,
            left_value: -6.0,
            right_value: 6.0,
        }],
    };
    write_model_archive(&config.model_dir, &model);
    std::fs::write(
        config.output_dir_test.join("test.csv"),
        "1,2.0\n0,-1.0\n1,3.0\n",
    )
    .unwrap();

    let err = evaluate::run(&config).unwrap_err();
    assert!(matches!(
        err,
        EvaluateError::FeatureWidth {
            expected: 3,
            found: 1
        }
    ));
    assert!(!config.evaluation_dir.join(REPORT_FILE_NAME).exists());
}

#[test]
fn missing_archive_terminates_without_report() {
    let dir = TempDir::new().unwrap();
    let config = pipeline_config(dir.path());
    std::fs::write(config.output_dir_test.join("test.csv"), "1,0.0,0.0\n").unwrap();
    assert!(evaluate::run(&config).is_err());
    assert!(!config.evaluation_dir.join(REPORT_FILE_NAME).exists());
}

#[test]
fn empty_test_set_terminates_without_report() {
    let dir = TempDir::new().unwrap();
    let config = pipeline_config(dir.path());
    write_model_archive(&config.model_dir, &sample_model());
    std::fs::write(config.output_dir_test.join("test.csv"), "").unwrap();
    assert!(evaluate::run(&config).is_err());
    assert!(!config.evaluation_dir.join(REPORT_FILE_NAME).exists());
}

#[test]
fn single_class_labels_terminate_without_report() {
    let dir = TempDir::new().unwrap();
    let config = pipeline_config(dir.path());
    write_model_archive(&config.model_dir, &sample_model());
    std::fs::write(
        config.output_dir_test.join("test.csv"),
        "1,2.0,0.0\n1,1.0,0.0\n",
    )
    .unwrap();
    let err = evaluate::run(&config).unwrap_err();
    assert!(err.to_string().contains("both classes"));
    assert!(!config.evaluation_dir.join(REPORT_FILE_NAME).exists());
}

#[test]
fn corrupt_model_json_terminates() {
    let dir = TempDir::new().unwrap();
    let config = pipeline_config(dir.path());
    std::fs::create_dir_all(&config.model_dir).unwrap();
    let file = File::create(config.model_dir.join(MODEL_ARCHIVE_NAME)).unwrap();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let body = b"not a model";
    let mut header = tar::Header::new_gnu();
    header.set_size(body.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, MODEL_FILE_NAME, body.as_slice())
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap();
    std::fs::write(config.output_dir_test.join("test.csv"), "1,0.0,0.0\n").unwrap();
    assert!(evaluate::run(&config).is_err());
}
