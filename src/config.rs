//! Runtime configuration for the risk calculator.

use crate::classifier::{RiskClassifier, DEFAULT_CUTOFF};
use crate::errors::{RiskError, RiskResult};
use crate::recommendations::{RecommendationEngine, ReferenceRanges};
use crate::resources::ArtifactSource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCalcConfig {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_scaler_path")]
    pub scaler_path: PathBuf,
    /// Expected hex digest of the model artifact, checked at load when set
    #[serde(default)]
    pub model_sha256: Option<String>,
    #[serde(default)]
    pub scaler_sha256: Option<String>,
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub recommendations: RecommendationSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSettings {
    #[serde(default = "default_true")]
    pub include_normal_findings: bool,
    #[serde(default)]
    pub ranges: ReferenceRanges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/gbm_model.json")
}

fn default_scaler_path() -> PathBuf {
    PathBuf::from("models/scaler.json")
}

fn default_cutoff() -> f64 {
    DEFAULT_CUTOFF
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            include_normal_findings: true,
            ranges: ReferenceRanges::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RiskCalcConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            scaler_path: default_scaler_path(),
            model_sha256: None,
            scaler_sha256: None,
            cutoff: DEFAULT_CUTOFF,
            log_level: default_log_level(),
            recommendations: RecommendationSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl RiskCalcConfig {
    /// Check every value that cannot be caught by deserialization
    pub fn validate(&self) -> RiskResult<()> {
        if self.model_path.as_os_str().is_empty() {
            return Err(RiskError::config("model_path cannot be empty"));
        }
        if self.scaler_path.as_os_str().is_empty() {
            return Err(RiskError::config("scaler_path cannot be empty"));
        }
        self.classifier()?;
        self.recommendations.ranges.validate()?;
        self.log_level
            .parse::<tracing::Level>()
            .map_err(|_| RiskError::config(format!("unknown log_level '{}'", self.log_level)))?;
        Ok(())
    }

    pub fn artifact_source(&self) -> ArtifactSource {
        ArtifactSource {
            model_path: self.model_path.clone(),
            scaler_path: self.scaler_path.clone(),
            model_sha256: self.model_sha256.clone(),
            scaler_sha256: self.scaler_sha256.clone(),
        }
    }

    pub fn classifier(&self) -> RiskResult<RiskClassifier> {
        RiskClassifier::new(self.cutoff)
    }

    pub fn recommendation_engine(&self) -> RiskResult<RecommendationEngine> {
        RecommendationEngine::new(
            self.recommendations.ranges,
            self.recommendations.include_normal_findings,
        )
    }
}
