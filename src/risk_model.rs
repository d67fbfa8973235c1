//! Risk model abstraction and artifact loading.
//!
//! A model maps a scaled feature vector to the probability of death
//! within one year. Two artifact kinds are understood: a gradient-boosted
//! tree ensemble (the production calculator) and a plain logistic model.

use crate::errors::{RiskError, RiskResult};
use crate::features::ScaledVector;
use crate::gbm::GradientBoostedModel;
use crate::risk_linear::LogisticRiskModel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A trained binary classifier over scaled inputs
pub trait RiskModel: Send + Sync {
    fn model_id(&self) -> &str;

    /// Short name of the model family, e.g. `gradient_boosting`
    fn kind(&self) -> &'static str;

    /// Number of inputs the model was trained on
    fn input_dim(&self) -> usize;

    /// Probability of the positive class, in [0, 1]
    fn predict_probability(&self, features: &ScaledVector) -> RiskResult<f64>;
}

/// Optional provenance carried by a model artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Serialized model, tagged by family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    GradientBoosting(GradientBoostedModel),
    Logistic(LogisticRiskModel),
}

impl ModelArtifact {
    pub fn from_json(content: &str) -> RiskResult<Self> {
        serde_json::from_str(content).map_err(|e| RiskError::serialization("parsing model artifact", e))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> RiskResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RiskError::io(format!("reading model {}", path.display()), e))?;
        Self::from_json(&content)
    }

    pub fn metadata(&self) -> &ModelMetadata {
        match self {
            ModelArtifact::GradientBoosting(m) => &m.metadata,
            ModelArtifact::Logistic(m) => &m.metadata,
        }
    }

    /// Validate the artifact and turn it into a usable model
    pub fn into_model(self) -> RiskResult<Box<dyn RiskModel>> {
        match self {
            ModelArtifact::GradientBoosting(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
            ModelArtifact::Logistic(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
        }
    }
}

/// Logistic link shared by both model families
pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Reject a scaled vector whose width differs from the model's input size
pub(crate) fn check_input_dim(model: &dyn RiskModel, features: &ScaledVector) -> RiskResult<()> {
    if features.len() != model.input_dim() {
        return Err(RiskError::model(format!(
            "model '{}' expects {} inputs, got {}",
            model.model_id(),
            model.input_dim(),
            features.len()
        )));
    }
    Ok(())
}

/// Map a raw log-odds score to a probability, refusing non-finite output
pub(crate) fn probability_from_logit(model_id: &str, logit: f64) -> RiskResult<f64> {
    if logit.is_nan() {
        return Err(RiskError::model(format!("model '{model_id}' produced a non-numeric score")));
    }
    Ok(sigmoid(logit).clamp(0.0, 1.0))
}
