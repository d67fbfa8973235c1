//! Startup-loaded scaler and model.
//!
//! Both artifacts are read once, checked against the feature schema and
//! each other, then shared read-only for the life of the process.

use crate::errors::{RiskError, RiskResult};
use crate::risk_model::{ModelArtifact, ModelMetadata, RiskModel};
use crate::scaler::StandardScaler;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where to find the artifacts and what they should hash to
#[derive(Debug, Clone)]
pub struct ArtifactSource {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub model_sha256: Option<String>,
    pub scaler_sha256: Option<String>,
}

/// Digests of the files actually loaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactDigests {
    pub model_sha256: Option<String>,
    pub scaler_sha256: Option<String>,
}

pub struct LoadedResources {
    scaler: StandardScaler,
    model: Box<dyn RiskModel>,
    metadata: ModelMetadata,
    digests: ArtifactDigests,
}

impl std::fmt::Debug for LoadedResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedResources")
            .field("model_id", &self.model.model_id())
            .field("model_kind", &self.model.kind())
            .field("n_features", &self.scaler.n_features())
            .field("digests", &self.digests)
            .finish()
    }
}

impl LoadedResources {
    /// Pair an in-memory scaler with a model, checking their dimensions agree.
    pub fn new(scaler: StandardScaler, model: Box<dyn RiskModel>) -> RiskResult<Self> {
        scaler.check_schema()?;
        if model.input_dim() != scaler.n_features() {
            return Err(RiskError::config(format!(
                "model '{}' takes {} inputs but the scaler produces {}",
                model.model_id(),
                model.input_dim(),
                scaler.n_features()
            )));
        }
        Ok(Self {
            scaler,
            model,
            metadata: ModelMetadata::default(),
            digests: ArtifactDigests::default(),
        })
    }

    /// Read, verify and validate both artifacts from disk
    pub fn load(source: &ArtifactSource) -> RiskResult<Self> {
        let scaler_bytes = read_artifact(&source.scaler_path, "scaler")?;
        let scaler_sha256 = sha256_hex(&scaler_bytes);
        verify_digest("scaler", &source.scaler_path, &scaler_sha256, source.scaler_sha256.as_deref())?;

        let model_bytes = read_artifact(&source.model_path, "model")?;
        let model_sha256 = sha256_hex(&model_bytes);
        verify_digest("model", &source.model_path, &model_sha256, source.model_sha256.as_deref())?;

        let scaler = StandardScaler::from_json(&utf8(&scaler_bytes, &source.scaler_path)?)?;
        let artifact = ModelArtifact::from_json(&utf8(&model_bytes, &source.model_path)?)?;
        let metadata = artifact.metadata().clone();
        let model = artifact.into_model()?;

        let mut resources = Self::new(scaler, model)?;
        resources.metadata = metadata;
        resources.digests = ArtifactDigests {
            model_sha256: Some(model_sha256),
            scaler_sha256: Some(scaler_sha256),
        };

        info!(
            model_id = resources.model.model_id(),
            model_kind = resources.model.kind(),
            n_features = resources.scaler.n_features(),
            model_sha256 = resources.digests.model_sha256.as_deref().unwrap_or_default(),
            scaler_sha256 = resources.digests.scaler_sha256.as_deref().unwrap_or_default(),
            "Loaded risk model artifacts"
        );

        Ok(resources)
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn model(&self) -> &dyn RiskModel {
        self.model.as_ref()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn digests(&self) -> &ArtifactDigests {
        &self.digests
    }
}

fn read_artifact(path: &Path, what: &str) -> RiskResult<Vec<u8>> {
    debug!(path = %path.display(), "Reading {what} artifact");
    std::fs::read(path).map_err(|e| RiskError::io(format!("reading {what} {}", path.display()), e))
}

fn utf8(bytes: &[u8], path: &Path) -> RiskResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| RiskError::config(format!("{} is not valid UTF-8", path.display())))
}

/// Lowercase hex sha256 of a byte slice
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn verify_digest(what: &str, path: &Path, actual: &str, expected: Option<&str>) -> RiskResult<()> {
    match expected {
        Some(expected) if !expected.trim().eq_ignore_ascii_case(actual) => Err(RiskError::config(format!(
            "{what} {} has sha256 {actual}, expected {}",
            path.display(),
            expected.trim()
        ))),
        _ => Ok(()),
    }
}
