//! Standardization of raw features with pre-fit parameters.

use crate::errors::{RiskError, RiskResult};
use crate::features::{FeatureVector, ScaledVector, FEATURE_ORDER, NUM_FEATURES};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pre-fit standardization parameters, one (mean, scale) pair per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler and check it against the feature schema
    pub fn new(feature_names: Vec<String>, mean: Vec<f64>, scale: Vec<f64>) -> RiskResult<Self> {
        let scaler = Self {
            feature_names,
            mean,
            scale,
        };
        scaler.check_schema()?;
        Ok(scaler)
    }

    /// Parse scaler parameters from their JSON artifact
    pub fn from_json(content: &str) -> RiskResult<Self> {
        let scaler: StandardScaler = serde_json::from_str(content)
            .map_err(|e| RiskError::serialization("parsing scaler parameters", e))?;
        scaler.check_schema()?;
        Ok(scaler)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> RiskResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RiskError::io(format!("reading scaler {}", path.display()), e))?;
        Self::from_json(&content)
    }

    /// Reject parameters that were not fit on the current schema.
    pub fn check_schema(&self) -> RiskResult<()> {
        if self.feature_names.len() != NUM_FEATURES
            || self.mean.len() != NUM_FEATURES
            || self.scale.len() != NUM_FEATURES
        {
            return Err(RiskError::config(format!(
                "scaler was fit on {} names / {} means / {} scales, expected {}",
                self.feature_names.len(),
                self.mean.len(),
                self.scale.len(),
                NUM_FEATURES
            )));
        }

        for (position, (name, expected)) in self.feature_names.iter().zip(FEATURE_ORDER).enumerate() {
            if name != expected.key() {
                return Err(RiskError::config(format!(
                    "scaler column {position} is '{name}', expected '{}'",
                    expected.key()
                )));
            }
        }

        for (feature, (mean, scale)) in FEATURE_ORDER.iter().zip(self.mean.iter().zip(&self.scale)) {
            if !mean.is_finite() {
                return Err(RiskError::config(format!("scaler mean for '{feature}' is not finite")));
            }
            if !scale.is_finite() || *scale <= 0.0 {
                return Err(RiskError::config(format!(
                    "scaler scale for '{feature}' must be a positive number, got {scale}"
                )));
            }
        }

        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize a feature vector: `(raw - mean) / scale` per column
    pub fn transform(&self, features: &FeatureVector) -> RiskResult<ScaledVector> {
        self.transform_values(&features.to_array())
    }

    /// Standardize raw values already laid out in schema order.
    pub fn transform_values(&self, raw: &[f64]) -> RiskResult<ScaledVector> {
        if raw.len() != self.n_features() {
            return Err(RiskError::config(format!(
                "scaler expects {} features, got {}",
                self.n_features(),
                raw.len()
            )));
        }

        let scaled = raw
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect();

        Ok(ScaledVector::new(scaled))
    }
}
