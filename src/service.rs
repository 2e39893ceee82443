use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use log::{debug, warn};

use crate::classifier::artifact::{ArtifactError, load_artifact};
use crate::classifier::{ClassifierArtifact, confidence_from};
use crate::config::ServiceConfig;
use crate::data::features::build_features;
use crate::data::model::{ClassificationResult, MagnitudeObservation, ValidatedObservation};
use crate::data::validate::ValidationFailure;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Outcome of [`InferenceService::classify`] when no result is produced.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// Inputs outside the trained range. Expected and user-correctable.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    /// The artifact could not be acquired. The service cannot serve anything.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

// ---------------------------------------------------------------------------
// InferenceService
// ---------------------------------------------------------------------------

/// Owns the classifier artifact and answers single-object requests.
///
/// The artifact is deserialized at most once. Reads after that go through a
/// lock-free `OnceLock`; the mutex only serialises the first load so racing
/// callers never deserialize twice.
pub struct InferenceService {
    config: ServiceConfig,
    artifact: OnceLock<Arc<ClassifierArtifact>>,
    load_guard: Mutex<()>,
    loads: AtomicUsize,
}

impl InferenceService {
    /// No I/O happens until the first [`load`](Self::load).
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            artifact: OnceLock::new(),
            load_guard: Mutex::new(()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Build a service around an artifact that is already in memory.
    pub fn with_artifact(config: ServiceConfig, artifact: ClassifierArtifact) -> Self {
        let service = Self::new(config);
        let _ = service.artifact.set(Arc::new(artifact));
        service
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Acquire the shared artifact, deserializing it on first use.
    pub fn load(&self) -> Result<Arc<ClassifierArtifact>, ArtifactError> {
        if let Some(artifact) = self.artifact.get() {
            return Ok(Arc::clone(artifact));
        }

        let _guard = self.load_guard.lock().map_err(|_| ArtifactError::Poisoned)?;
        if let Some(artifact) = self.artifact.get() {
            return Ok(Arc::clone(artifact));
        }

        let artifact = Arc::new(load_artifact(&self.config.model_path)?);
        self.loads.fetch_add(1, Ordering::SeqCst);
        let _ = self.artifact.set(Arc::clone(&artifact));
        Ok(artifact)
    }

    /// Number of successful reads of the artifact from storage.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.artifact.get().is_some()
    }

    /// Classify an observation that already passed the validation gate.
    pub fn predict(&self, obs: &ValidatedObservation) -> Result<ClassificationResult, ArtifactError> {
        let artifact = self.load()?;
        let features = build_features(obs.observation());
        debug!("features: {:?}", features.as_array());

        let code = artifact.predict_class(&features);
        let confidence = artifact
            .predict_proba(&features)
            .and_then(|distribution| confidence_from(&distribution));

        let result = ClassificationResult::from_code(code, confidence);
        if !result.class.is_known() {
            warn!("classifier returned unrecognised class code {code}");
        }
        debug!("prediction: {} (confidence {:?})", result.class.label(), result.confidence);
        Ok(result)
    }

    /// Caller entry point: validate, then predict.
    ///
    /// Out-of-range inputs return before the artifact is touched.
    pub fn classify(
        &self,
        u: f64,
        g: f64,
        r: f64,
        i: f64,
        z: f64,
    ) -> Result<ClassificationResult, ClassifyError> {
        let obs = MagnitudeObservation::new(u, g, r, i, z);
        let validated = self.config.bounds.validate(&obs).map_err(|failure| {
            warn!("{failure}");
            failure
        })?;
        Ok(self.predict(&validated)?)
    }
}
