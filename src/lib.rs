//! Validated single-object inference for galaxy / quasar / star
//! classification from ugriz magnitudes.
//!
//! ```no_run
//! use rusty_starclass::{InferenceService, ServiceConfig};
//!
//! let service = InferenceService::new(ServiceConfig::default());
//! match service.classify(19.5, 18.0, 17.2, 16.9, 16.5) {
//!     Ok(result) => println!("{result}"),
//!     Err(err) => eprintln!("{err}"),
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod data;
pub mod service;

pub use classifier::artifact::{ArtifactError, ArtifactFile, ModelSpec, load_artifact};
pub use classifier::{Classifier, ClassifierArtifact, ProbabilisticClassifier};
pub use config::{ConfigError, ServiceConfig};
pub use data::features::build_features;
pub use data::model::{
    Band, ClassificationResult, FEATURE_NAMES, FeatureVector, MagnitudeObservation, ObjectClass,
    ValidatedObservation,
};
pub use data::validate::{BandViolation, Interval, MagnitudeBounds, ValidationFailure};
pub use service::{ClassifyError, InferenceService};
