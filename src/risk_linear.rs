//! Logistic regression risk model.

use crate::errors::{RiskError, RiskResult};
use crate::features::ScaledVector;
use crate::risk_model::{check_input_dim, probability_from_logit, ModelMetadata, RiskModel};
use serde::{Deserialize, Serialize};

/// Logistic regression over scaled inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRiskModel {
    pub model_id: String,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(flatten)]
    pub metadata: ModelMetadata,
}

impl LogisticRiskModel {
    pub fn new(model_id: impl Into<String>, coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            model_id: model_id.into(),
            coefficients,
            intercept,
            metadata: ModelMetadata::default(),
        }
    }

    pub fn validate(&self) -> RiskResult<()> {
        if self.coefficients.is_empty() {
            return Err(RiskError::config(format!(
                "logistic model '{}' has no coefficients",
                self.model_id
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err(RiskError::config(format!(
                "logistic model '{}' has non-finite parameters",
                self.model_id
            )));
        }
        Ok(())
    }

    /// Linear combination: intercept + sum(weight_i * feature_i)
    pub fn decision_function(&self, features: &ScaledVector) -> f64 {
        self.intercept
            + features
                .as_slice()
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }
}

impl RiskModel for LogisticRiskModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn kind(&self) -> &'static str {
        "logistic"
    }

    fn input_dim(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_probability(&self, features: &ScaledVector) -> RiskResult<f64> {
        check_input_dim(self, features)?;
        probability_from_logit(&self.model_id, self.decision_function(features))
    }
}
