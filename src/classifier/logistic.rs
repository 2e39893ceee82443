use serde::{Deserialize, Serialize};

use super::{Classifier, ProbabilisticClassifier, argmax};
use crate::data::model::{FEATURE_COUNT, FeatureVector};

/// Per-feature standardisation applied before the linear layer
/// (`(x - mean) / scale`), as exported from a scaling pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    pub mean: [f64; FEATURE_COUNT],
    pub scale: [f64; FEATURE_COUNT],
}

/// Multinomial logistic regression: softmax over `W·x + b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub class_codes: Vec<i64>,
    pub weights: Vec<[f64; FEATURE_COUNT]>,
    pub intercepts: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<Standardizer>,
}

impl LogisticRegression {
    pub fn validate(&self) -> Result<(), String> {
        let n = self.class_codes.len();
        if n == 0 {
            return Err("logistic has no classes".to_string());
        }
        if self.weights.len() != n || self.intercepts.len() != n {
            return Err(format!(
                "logistic has {n} class codes, {} weight rows and {} intercepts",
                self.weights.len(),
                self.intercepts.len()
            ));
        }
        let finite = self
            .weights
            .iter()
            .flat_map(|row| row.iter())
            .chain(self.intercepts.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err("logistic has a non-finite coefficient".to_string());
        }
        if let Some(scaler) = &self.scaler {
            let bad_scale = scaler
                .scale
                .iter()
                .any(|s| !s.is_finite() || *s == 0.0);
            if bad_scale || scaler.mean.iter().any(|m| !m.is_finite()) {
                return Err("logistic scaler needs finite means and non-zero scales".to_string());
            }
        }
        Ok(())
    }

    fn decision_scores(&self, features: &FeatureVector) -> Vec<f64> {
        let mut x = features.as_array();
        if let Some(scaler) = &self.scaler {
            for ((v, mean), scale) in x.iter_mut().zip(scaler.mean).zip(scaler.scale) {
                *v = (*v - mean) / scale;
            }
        }
        self.weights
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(x.iter()).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect()
    }
}

/// Softmax with the max logit subtracted first so large scores don't overflow.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let top = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - top).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl Classifier for LogisticRegression {
    fn predict_class(&self, features: &FeatureVector) -> i64 {
        argmax(&self.decision_scores(features))
            .map(|idx| self.class_codes[idx])
            .unwrap_or(-1)
    }

    fn kind(&self) -> &'static str {
        "logistic"
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        softmax(&self.decision_scores(features))
    }
}
