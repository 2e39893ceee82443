use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::data::model::{FEATURE_COUNT, FeatureVector};

/// Nearest-centroid model. Reports a class code only, no probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestCentroid {
    pub class_codes: Vec<i64>,
    pub centroids: Vec<[f64; FEATURE_COUNT]>,
}

impl NearestCentroid {
    pub fn validate(&self) -> Result<(), String> {
        if self.centroids.is_empty() {
            return Err("nearest_centroid has no centroids".to_string());
        }
        if self.centroids.len() != self.class_codes.len() {
            return Err(format!(
                "nearest_centroid has {} centroids but {} class codes",
                self.centroids.len(),
                self.class_codes.len()
            ));
        }
        if let Some(idx) = self
            .centroids
            .iter()
            .position(|c| c.iter().any(|v| !v.is_finite()))
        {
            return Err(format!("nearest_centroid centroid {idx} has a non-finite value"));
        }
        Ok(())
    }
}

fn squared_distance(a: &[f64; FEATURE_COUNT], b: &[f64; FEATURE_COUNT]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

impl Classifier for NearestCentroid {
    fn predict_class(&self, features: &FeatureVector) -> i64 {
        let x = features.as_array();
        let mut best: Option<(usize, f64)> = None;
        for (idx, centroid) in self.centroids.iter().enumerate() {
            let d = squared_distance(&x, centroid);
            match best {
                Some((_, top)) if d >= top => {}
                _ => best = Some((idx, d)),
            }
        }
        // Validated models always have a centroid; -1 decodes to Unknown otherwise.
        best.map(|(idx, _)| self.class_codes[idx]).unwrap_or(-1)
    }

    fn kind(&self) -> &'static str {
        "nearest_centroid"
    }
}
