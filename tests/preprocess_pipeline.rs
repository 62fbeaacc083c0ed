//! End-to-end scenarios for the preprocessing step.

use std::path::Path;

use loanpipe::config::PipelineConfig;
use loanpipe::preprocess::{self, PreprocessError, PreprocessOptions};
use loanpipe::table::read_headerless_matrix;
use tempfile::TempDir;

/// 100-row raw dataset: string id, 3 numeric columns, 2 categorical columns,
/// binary Y/N status, with a sprinkling of missing cells.
fn write_sample_csv(dir: &Path) {
    let mut text = String::from(
        "Loan_ID,Gender,ApplicantIncome,LoanAmount,Credit_History,Property_Area,Loan_Status\n",
    );
    for i in 0..100usize {
        let gender = if i % 17 == 0 {
            ""
        } else if i % 2 == 0 {
            "Male"
        } else {
            "Female"
        };
        let income = 2000 + i * 37;
        let amount = if i % 19 == 0 {
            String::new()
        } else {
            (100 + (i % 13) * 10).to_string()
        };
        let credit = if i % 4 == 0 { 0 } else { 1 };
        let area = ["Urban", "Rural", "Semiurban"][i % 3];
        let status = if i % 3 == 0 { "N" } else { "Y" };
        text.push_str(&format!(
            "LP{i:03},{gender},{income},{amount},{credit},{area},{status}\n"
        ));
    }
    std::fs::write(dir.join("sample.csv"), text).unwrap();
}

fn pipeline_config(root: &Path) -> PipelineConfig {
    PipelineConfig {
        input_dir: root.join("input"),
        output_dir_train: root.join("train"),
        output_dir_validation: root.join("validation"),
        output_dir_test: root.join("test"),
        ..PipelineConfig::default()
    }
}

fn run_sample(seed: u64) -> (TempDir, preprocess::PreprocessSummary) {
    let dir = TempDir::new().unwrap();
    let config = pipeline_config(dir.path());
    std::fs::create_dir_all(&config.input_dir).unwrap();
    write_sample_csv(&config.input_dir);
    let options = PreprocessOptions {
        seed: Some(seed),
        ..PreprocessOptions::default()
    };
    let summary = preprocess::run(&config, &options).unwrap();
    (dir, summary)
}

#[test]
fn hundred_rows_produce_70_15_15_partitions() {
    let (dir, summary) = run_sample(11);
    assert_eq!(summary.input_rows, 100);
    assert_eq!(summary.train_rows, 70);
    assert_eq!(summary.validation_rows, 15);
    assert_eq!(summary.test_rows, 15);

    let train = read_headerless_matrix(&dir.path().join("train/train.csv")).unwrap();
    let validation =
        read_headerless_matrix(&dir.path().join("validation/validation.csv")).unwrap();
    let test = read_headerless_matrix(&dir.path().join("test/test.csv")).unwrap();
    assert_eq!(train.len(), 70);
    assert_eq!(validation.len(), 15);
    assert_eq!(test.len(), 15);

    // 1 label + 3 standardized numerics + one-hot(Gender)=2 + one-hot(Property_Area)=3.
    assert_eq!(summary.output_width, 9);
    for row in train.iter().chain(&validation).chain(&test) {
        assert_eq!(row.len(), 9);
    }
}

#[test]
fn label_column_holds_only_zero_and_one() {
    let (dir, _) = run_sample(23);
    let mut positives = 0usize;
    for name in ["train/train.csv", "validation/validation.csv", "test/test.csv"] {
        for row in read_headerless_matrix(&dir.path().join(name)).unwrap() {
            assert!(row[0] == 0.0 || row[0] == 1.0, "label was {}", row[0]);
            if row[0] == 1.0 {
                positives += 1;
            }
        }
    }
    // 66 rows carry status Y; N sorts before Y so Y encodes as 1.
    assert_eq!(positives, 66);
}

// The scalers are fit on the full dataset before the split, so the combined
// partitions standardize exactly while any single partition only
// approximately does. Known leakage in the pipeline contract, documented
// here rather than corrected.
#[test]
fn numeric_columns_standardize_over_the_combined_partitions() {
    let (dir, _) = run_sample(42);
    let mut rows = Vec::new();
    for name in ["train/train.csv", "validation/validation.csv", "test/test.csv"] {
        rows.extend(read_headerless_matrix(&dir.path().join(name)).unwrap());
    }
    assert_eq!(rows.len(), 100);
    for col in 1..=3 {
        let n = rows.len() as f64;
        let mean = rows.iter().map(|row| row[col]).sum::<f64>() / n;
        let variance = rows.iter().map(|row| (row[col] - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-9, "column {col} mean {mean}");
        assert!((variance - 1.0).abs() < 1e-9, "column {col} variance {variance}");
    }
}

#[test]
fn one_hot_blocks_are_indicators() {
    let (dir, _) = run_sample(5);
    let train = read_headerless_matrix(&dir.path().join("train/train.csv")).unwrap();
    for row in &train {
        // Every cell here is a fitted category (missing cells impute to one),
        // so each one-hot block sums to exactly 1.
        let gender: f64 = row[4..6].iter().sum();
        let area: f64 = row[6..9].iter().sum();
        assert_eq!(gender, 1.0);
        assert_eq!(area, 1.0);
        for &value in &row[4..9] {
            assert!(value == 0.0 || value == 1.0);
        }
    }
}

#[test]
fn missing_input_file_fails_immediately() {
    let dir = TempDir::new().unwrap();
    let config = pipeline_config(dir.path());
    std::fs::create_dir_all(&config.input_dir).unwrap();
    let err = preprocess::run(&config, &PreprocessOptions::default()).unwrap_err();
    assert!(err.to_string().contains("sample.csv"));
}

#[test]
fn missing_label_cell_is_an_error_not_a_panic() {
    let dir = TempDir::new().unwrap();
    let config = pipeline_config(dir.path());
    std::fs::create_dir_all(&config.input_dir).unwrap();
    std::fs::write(
        config.input_dir.join("sample.csv"),
        "Loan_ID,ApplicantIncome,Loan_Status\nLP001,2000,Y\nLP002,3000,\nLP003,4000,N\n",
    )
    .unwrap();
    let err = preprocess::run(&config, &PreprocessOptions::default()).unwrap_err();
    assert!(matches!(err, PreprocessError::Encode(_)), "got {err}");
}

#[test]
fn same_seed_reproduces_the_split() {
    let (dir_a, _) = run_sample(99);
    let (dir_b, _) = run_sample(99);
    let a = std::fs::read_to_string(dir_a.path().join("train/train.csv")).unwrap();
    let b = std::fs::read_to_string(dir_b.path().join("train/train.csv")).unwrap();
    assert_eq!(a, b);
}
