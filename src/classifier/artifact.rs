use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::centroid::NearestCentroid;
use super::forest::DecisionForest;
use super::logistic::LogisticRegression;
use super::ClassifierArtifact;
use crate::data::model::{FEATURE_NAMES, ObjectClass};

/// Bumped whenever the feature layout or class encoding changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Artifact location relative to the deployment root.
pub const DEFAULT_MODEL_PATH: &str = "model/model.json";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while acquiring the classifier artifact. All are fatal for
/// the service: there is no fallback model.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact not found at {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read artifact {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse artifact {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unsupported artifact format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("artifact schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("invalid model in artifact: {0}")]
    InvalidModel(String),
    #[error("artifact load guard poisoned")]
    Poisoned,
}

// ---------------------------------------------------------------------------
// On-disk format
// ---------------------------------------------------------------------------

/// The concrete model carried by an artifact, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    NearestCentroid(NearestCentroid),
    Logistic(LogisticRegression),
    DecisionForest(DecisionForest),
}

impl ModelSpec {
    fn class_codes(&self) -> &[i64] {
        match self {
            ModelSpec::NearestCentroid(m) => &m.class_codes,
            ModelSpec::Logistic(m) => &m.class_codes,
            ModelSpec::DecisionForest(m) => &m.class_codes,
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            ModelSpec::NearestCentroid(m) => m.validate(),
            ModelSpec::Logistic(m) => m.validate(),
            ModelSpec::DecisionForest(m) => m.validate(),
        }
    }
}

/// Serialized artifact: schema header plus model parameters.
///
/// ```json
/// {
///   "schema_version": 1,
///   "feature_names": ["u","g","r","i","z","u_g","g_r","r_i","i_z"],
///   "classes": {"GALAXY": 0, "QSO": 1, "STAR": 2},
///   "model": { "kind": "decision_forest", ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    pub classes: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub model: ModelSpec,
}

/// The label → code table every artifact must declare.
pub fn expected_classes() -> BTreeMap<String, i64> {
    ObjectClass::ENCODING
        .iter()
        .map(|(class, code)| (class.label().to_string(), *code))
        .collect()
}

impl ArtifactFile {
    /// Wrap a model with the current schema header.
    pub fn new(model: ModelSpec) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            classes: expected_classes(),
            description: String::new(),
            model,
        }
    }

    /// Reject artifacts built for a different feature layout or encoding.
    pub fn check_schema(&self) -> Result<(), ArtifactError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ArtifactError::SchemaMismatch(format!(
                "schema_version {} (expected {SCHEMA_VERSION})",
                self.schema_version
            )));
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
            return Err(ArtifactError::SchemaMismatch(format!(
                "feature_names [{}] (expected [{}])",
                self.feature_names.join(","),
                FEATURE_NAMES.join(",")
            )));
        }
        if self.classes != expected_classes() {
            return Err(ArtifactError::SchemaMismatch(format!(
                "classes {:?} (expected GALAXY=0, QSO=1, STAR=2)",
                self.classes
            )));
        }
        Ok(())
    }

    /// Check the header and model structure, then box the model by capability.
    pub fn into_artifact(self) -> Result<ClassifierArtifact, ArtifactError> {
        self.check_schema()?;
        self.model.validate().map_err(ArtifactError::InvalidModel)?;

        for code in self.model.class_codes() {
            if !ObjectClass::from_code(*code).is_known() {
                warn!("artifact model emits class code {code} outside the label table");
            }
        }

        Ok(match self.model {
            ModelSpec::NearestCentroid(m) => ClassifierArtifact::Basic(Box::new(m)),
            ModelSpec::Logistic(m) => ClassifierArtifact::Probabilistic(Box::new(m)),
            ModelSpec::DecisionForest(m) => ClassifierArtifact::Probabilistic(Box::new(m)),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read and check an artifact. Dispatch by extension.
///
/// Supported formats:
/// * `.json` – [`ArtifactFile`] document
pub fn load_artifact(path: &Path) -> Result<ClassifierArtifact, ArtifactError> {
    // A directory at the artifact path counts as missing.
    if !path.is_file() {
        return Err(ArtifactError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let file = match ext.as_str() {
        "json" => read_json(path)?,
        _ => {
            return Err(ArtifactError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let artifact = file.into_artifact()?;
    info!(
        "loaded {} artifact from {} ({})",
        artifact.kind(),
        path.display(),
        if artifact.is_probabilistic() {
            "with class probabilities"
        } else {
            "class codes only"
        }
    );
    Ok(artifact)
}

fn read_json(path: &Path) -> Result<ArtifactFile, ArtifactError> {
    let text = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::forest::{DecisionTree, TreeNode};
    use crate::data::model::FEATURE_COUNT;

    fn centroid_file() -> ArtifactFile {
        ArtifactFile::new(ModelSpec::NearestCentroid(NearestCentroid {
            class_codes: vec![0, 1, 2],
            centroids: vec![[20.0; FEATURE_COUNT], [18.0; FEATURE_COUNT], [16.0; FEATURE_COUNT]],
        }))
    }

    fn forest_file() -> ArtifactFile {
        ArtifactFile::new(ModelSpec::DecisionForest(DecisionForest {
            class_codes: vec![0, 1, 2],
            trees: vec![DecisionTree {
                nodes: vec![TreeNode::Leaf {
                    distribution: vec![2.0, 1.0, 1.0],
                }],
            }],
        }))
    }

    fn write_artifact(file: &ArtifactFile, suffix: &str) -> tempfile::NamedTempFile {
        let tmp = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        std::fs::write(tmp.path(), file.to_json().unwrap()).unwrap();
        tmp
    }

    #[test]
    fn centroid_artifact_is_basic() {
        let tmp = write_artifact(&centroid_file(), ".json");
        let artifact = load_artifact(tmp.path()).unwrap();
        assert!(!artifact.is_probabilistic());
        assert_eq!(artifact.kind(), "nearest_centroid");
    }

    #[test]
    fn forest_artifact_is_probabilistic() {
        let tmp = write_artifact(&forest_file(), ".json");
        let artifact = load_artifact(tmp.path()).unwrap();
        assert!(artifact.is_probabilistic());
        assert_eq!(artifact.kind(), "decision_forest");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model").join("model.json");
        let err = load_artifact(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { .. }));
        assert_eq!(err.to_string(), format!("artifact not found at {}", path.display()));
    }

    #[test]
    fn directory_at_artifact_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::create_dir(&path).unwrap();
        let err = load_artifact(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { .. }), "{err}");
        assert_eq!(err.to_string(), format!("artifact not found at {}", path.display()));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let tmp = write_artifact(&forest_file(), ".pkl");
        let err = load_artifact(tmp.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::UnsupportedFormat { .. }));
    }

    #[test]
    fn garbage_json_is_a_parse_error() {
        let tmp = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        std::fs::write(tmp.path(), "{ not json").unwrap();
        let err = load_artifact(tmp.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { .. }));
    }

    #[test]
    fn reordered_features_are_a_schema_mismatch() {
        let mut file = forest_file();
        file.feature_names.swap(5, 6);
        let err = file.into_artifact().unwrap_err();
        assert!(matches!(err, ArtifactError::SchemaMismatch(_)));
        assert!(err.to_string().contains("g_r,u_g"), "{err}");
    }

    #[test]
    fn different_encoding_is_a_schema_mismatch() {
        let mut file = forest_file();
        file.classes.insert("STAR".to_string(), 0);
        file.classes.insert("GALAXY".to_string(), 2);
        assert!(matches!(
            file.into_artifact(),
            Err(ArtifactError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn newer_schema_version_is_rejected() {
        let mut file = forest_file();
        file.schema_version = SCHEMA_VERSION + 1;
        let err = file.into_artifact().unwrap_err();
        assert!(err.to_string().contains("schema_version 2"), "{err}");
    }

    #[test]
    fn structurally_broken_model_is_invalid() {
        let mut file = centroid_file();
        if let ModelSpec::NearestCentroid(m) = &mut file.model {
            m.centroids.clear();
            m.class_codes.clear();
        }
        assert!(matches!(
            file.into_artifact(),
            Err(ArtifactError::InvalidModel(_))
        ));
    }

    #[test]
    fn kind_tag_selects_the_model() {
        let json = r#"{
            "schema_version": 1,
            "feature_names": ["u","g","r","i","z","u_g","g_r","r_i","i_z"],
            "classes": {"GALAXY": 0, "QSO": 1, "STAR": 2},
            "model": {
                "kind": "logistic",
                "class_codes": [0, 1, 2],
                "weights": [[0,0,0,0,0,1,0,0,0],[0,0,0,0,0,0,0,0,0],[0,0,0,0,0,-1,0,0,0]],
                "intercepts": [0, 0, 0]
            }
        }"#;
        let file: ArtifactFile = serde_json::from_str(json).unwrap();
        assert!(matches!(file.model, ModelSpec::Logistic(_)));
        assert!(file.into_artifact().unwrap().is_probabilistic());
    }
}
