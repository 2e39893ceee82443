//! Classifier layer: capability traits, concrete model kinds, and the
//! on-disk artifact loader.
//!
//! ```text
//!   model/model.json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ artifact  │  parse + schema check → ClassifierArtifact
//!   └──────────┘
//!        │
//!        ├── Basic          (class code only)
//!        └── Probabilistic  (class code + class distribution)
//! ```

pub mod artifact;
pub mod centroid;
pub mod forest;
pub mod logistic;

use crate::data::model::FeatureVector;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Anything that maps a feature vector to an integer class code.
pub trait Classifier: Send + Sync {
    fn predict_class(&self, features: &FeatureVector) -> i64;

    /// Short model-kind name for logs.
    fn kind(&self) -> &'static str;
}

/// A classifier that can also report a probability per class.
pub trait ProbabilisticClassifier: Classifier {
    /// One probability per class, summing to 1.
    fn predict_proba(&self, features: &FeatureVector) -> Vec<f64>;
}

/// A loaded model, tagged by what it can do.
pub enum ClassifierArtifact {
    Basic(Box<dyn Classifier>),
    Probabilistic(Box<dyn ProbabilisticClassifier>),
}

impl ClassifierArtifact {
    pub fn predict_class(&self, features: &FeatureVector) -> i64 {
        match self {
            ClassifierArtifact::Basic(model) => model.predict_class(features),
            ClassifierArtifact::Probabilistic(model) => model.predict_class(features),
        }
    }

    /// `None` for artifacts without probability output.
    pub fn predict_proba(&self, features: &FeatureVector) -> Option<Vec<f64>> {
        match self {
            ClassifierArtifact::Basic(_) => None,
            ClassifierArtifact::Probabilistic(model) => Some(model.predict_proba(features)),
        }
    }

    pub fn is_probabilistic(&self) -> bool {
        matches!(self, ClassifierArtifact::Probabilistic(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierArtifact::Basic(model) => model.kind(),
            ClassifierArtifact::Probabilistic(model) => model.kind(),
        }
    }
}

impl std::fmt::Debug for ClassifierArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let capability = if self.is_probabilistic() {
            "Probabilistic"
        } else {
            "Basic"
        };
        f.debug_struct("ClassifierArtifact")
            .field("capability", &capability)
            .field("kind", &self.kind())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Index of the largest value; the first one wins ties. NaN never wins.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if v <= top => {}
            _ => best = Some((idx, v)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Reported confidence: the largest class probability, kept inside `[0, 1]`.
pub fn confidence_from(distribution: &[f64]) -> Option<f64> {
    argmax(distribution).map(|idx| distribution[idx].clamp(0.0, 1.0))
}
