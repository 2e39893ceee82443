use serde::{Deserialize, Serialize};

use super::{Classifier, ProbabilisticClassifier, argmax};
use crate::data::model::{FEATURE_COUNT, FeatureVector};

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// One node of a flattened decision tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go `left` when `x[feature] <= threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class weights (counts or fractions) in `class_codes` order.
    Leaf { distribution: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Children must sit after their parent, which rules out cycles.
    fn validate(&self, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!("node {idx} splits on feature {feature}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has a non-finite threshold"));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx} points at invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { distribution } => {
                    if distribution.len() != n_classes {
                        return Err(format!(
                            "leaf {idx} has {} weights for {n_classes} classes",
                            distribution.len()
                        ));
                    }
                    if distribution.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(format!("leaf {idx} has a negative or non-finite weight"));
                    }
                    if distribution.iter().sum::<f64>() <= 0.0 {
                        return Err(format!("leaf {idx} has zero total weight"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf. `None` only for malformed trees.
    fn leaf(&self, x: &[f64; FEATURE_COUNT]) -> Option<&[f64]> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx)? {
                TreeNode::Leaf { distribution } => return Some(distribution),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x.get(*feature)? <= threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Forest
// ---------------------------------------------------------------------------

/// Ensemble of trees; probabilities are the mean of normalised leaf weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionForest {
    pub class_codes: Vec<i64>,
    pub trees: Vec<DecisionTree>,
}

impl DecisionForest {
    pub fn validate(&self) -> Result<(), String> {
        if self.class_codes.is_empty() {
            return Err("decision_forest has no classes".to_string());
        }
        if self.trees.is_empty() {
            return Err("decision_forest has no trees".to_string());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.class_codes.len())
                .map_err(|e| format!("decision_forest tree {t}: {e}"))?;
        }
        Ok(())
    }
}

impl Classifier for DecisionForest {
    fn predict_class(&self, features: &FeatureVector) -> i64 {
        argmax(&self.predict_proba(features))
            .map(|idx| self.class_codes[idx])
            .unwrap_or(-1)
    }

    fn kind(&self) -> &'static str {
        "decision_forest"
    }
}

impl ProbabilisticClassifier for DecisionForest {
    fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        let x = features.as_array();
        let mut proba = vec![0.0; self.class_codes.len()];
        let mut voters = 0usize;
        for distribution in self.trees.iter().filter_map(|tree| tree.leaf(&x)) {
            let total: f64 = distribution.iter().sum();
            for (acc, w) in proba.iter_mut().zip(distribution) {
                *acc += w / total;
            }
            voters += 1;
        }
        if voters > 0 {
            for p in &mut proba {
                *p /= voters as f64;
            }
        }
        proba
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::features::build_features;
    use crate::data::model::MagnitudeObservation;

    const U_G: usize = 5;
    const G_R: usize = 6;

    fn leaf(distribution: &[f64]) -> TreeNode {
        TreeNode::Leaf {
            distribution: distribution.to_vec(),
        }
    }

    fn split(feature: usize, threshold: f64, left: usize, right: usize) -> TreeNode {
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        }
    }

    fn forest() -> DecisionForest {
        DecisionForest {
            class_codes: vec![0, 1, 2],
            trees: vec![
                DecisionTree {
                    nodes: vec![
                        split(U_G, 0.6, 1, 2),
                        leaf(&[1.0, 8.0, 1.0]),
                        leaf(&[6.0, 0.0, 4.0]),
                    ],
                },
                DecisionTree {
                    nodes: vec![
                        split(G_R, 0.5, 1, 2),
                        leaf(&[0.0, 3.0, 7.0]),
                        leaf(&[9.0, 1.0, 0.0]),
                    ],
                },
            ],
        }
    }

    fn features(u: f64, g: f64, r: f64) -> FeatureVector {
        build_features(&MagnitudeObservation::new(u, g, r, 17.0, 16.8))
    }

    #[test]
    fn averages_normalised_leaves() {
        let f = forest();
        assert!(f.validate().is_ok());
        // u_g = 0.3 → left (0.1, 0.8, 0.1); g_r = 1.0 → right (0.9, 0.1, 0.0)
        let proba = f.predict_proba(&features(18.3, 18.0, 17.0));
        let expected = [0.5, 0.45, 0.05];
        for (p, e) in proba.iter().zip(expected) {
            assert!((p - e).abs() < 1e-12, "{proba:?}");
        }
        assert_eq!(f.predict_class(&features(18.3, 18.0, 17.0)), 0);
    }

    #[test]
    fn threshold_goes_left_when_equal() {
        let f = DecisionForest {
            class_codes: vec![0, 2],
            trees: vec![DecisionTree {
                nodes: vec![split(0, 19.0, 1, 2), leaf(&[1.0, 0.0]), leaf(&[0.0, 1.0])],
            }],
        };
        assert_eq!(f.predict_class(&features(19.0, 18.0, 17.5)), 0);
        assert_eq!(f.predict_class(&features(19.1, 18.0, 17.5)), 2);
    }

    #[test]
    fn backward_child_is_rejected() {
        let f = DecisionForest {
            class_codes: vec![0, 1, 2],
            trees: vec![DecisionTree {
                nodes: vec![split(0, 19.0, 1, 0), leaf(&[1.0, 0.0, 0.0])],
            }],
        };
        let err = f.validate().unwrap_err();
        assert!(err.contains("tree 0") && err.contains("invalid child 0"), "{err}");
    }

    #[test]
    fn leaf_width_must_match_classes() {
        let mut f = forest();
        f.trees[1].nodes[2] = leaf(&[1.0, 1.0]);
        assert!(f.validate().unwrap_err().contains("leaf 2 has 2 weights"));
    }

    #[test]
    fn out_of_range_feature_is_rejected() {
        let mut f = forest();
        f.trees[0].nodes[0] = split(FEATURE_COUNT, 0.0, 1, 2);
        assert!(f.validate().is_err());
    }

    #[test]
    fn nodes_round_trip_through_tagged_json() {
        let json = r#"{"type":"split","feature":5,"threshold":0.6,"left":1,"right":2}"#;
        let node: TreeNode = serde_json::from_str(json).unwrap();
        assert_eq!(node, split(U_G, 0.6, 1, 2));
    }
}
