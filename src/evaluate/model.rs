//! Serialized gradient-boosted stump classifier loaded at evaluation time.
//!
//! The training step bundles the model as a JSON document inside
//! `model.tar.gz`; this step only deserializes and scores it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::EvaluateError;

/// Single-node decision tree used as a weak learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stump {
    /// Feature index used for the split.
    pub feature_index: u16,
    /// Threshold in feature units.
    pub threshold: f64,
    /// Margin contribution for `feature <= threshold`.
    pub left_value: f64,
    /// Margin contribution for `feature > threshold`.
    pub right_value: f64,
}

impl Stump {
    /// Margin contribution of this stump for a feature vector.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let value = features.get(self.feature_index as usize).copied().unwrap_or(0.0);
        if value <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Boosted binary classifier scoring rows as positive-class probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedModel {
    /// Model format version.
    pub model_version: i64,
    /// Number of feature values expected per row.
    pub feature_len: usize,
    /// Initial raw margin before boosting rounds.
    pub base_score: f64,
    /// Learning rate applied to each stump contribution.
    pub learning_rate: f64,
    /// One stump per boosting round.
    pub stumps: Vec<Stump>,
}

impl BoostedModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.feature_len == 0 {
            return Err("feature_len must be positive".to_string());
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(format!("invalid learning_rate {}", self.learning_rate));
        }
        for (idx, stump) in self.stumps.iter().enumerate() {
            if stump.feature_index as usize >= self.feature_len {
                return Err(format!(
                    "stump {idx} splits on feature {} but feature_len is {}",
                    stump.feature_index, self.feature_len
                ));
            }
        }
        Ok(())
    }

    /// Load and validate a model from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self, EvaluateError> {
        let bytes = std::fs::read(path).map_err(|source| EvaluateError::Model {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;
        let model: Self = serde_json::from_slice(&bytes).map_err(|source| EvaluateError::Model {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;
        model.validate().map_err(|message| EvaluateError::Model {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(model)
    }

    /// Raw margin for a feature vector.
    pub fn predict_margin(&self, features: &[f64]) -> f64 {
        let mut margin = self.base_score;
        for stump in &self.stumps {
            margin += self.learning_rate * stump.predict(features);
        }
        margin
    }

    /// Positive-class probability for a feature vector.
    pub fn predict_score(&self, features: &[f64]) -> f64 {
        sigmoid(self.predict_margin(features))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
