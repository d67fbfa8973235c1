// Shared fixtures for integration tests
#![allow(dead_code)]

use shockrisk::config::RiskCalcConfig;
use shockrisk::features::{ScaledVector, FEATURE_ORDER};
use shockrisk::resources::{ArtifactSource, LoadedResources};
use shockrisk::{RiskModel, RiskResult, ScoringService, StandardScaler};
use std::path::PathBuf;
use std::sync::Arc;

pub fn models_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models")
}

/// Config pointing at the bundled demo artifacts
pub fn demo_config() -> RiskCalcConfig {
    RiskCalcConfig {
        model_path: models_dir().join("gbm_model.json"),
        scaler_path: models_dir().join("scaler.json"),
        ..RiskCalcConfig::default()
    }
}

pub fn demo_source() -> ArtifactSource {
    demo_config().artifact_source()
}

pub fn demo_service() -> ScoringService {
    let resources = LoadedResources::load(&demo_source()).expect("demo artifacts should load");
    ScoringService::with_defaults(Arc::new(resources))
}

/// Model that ignores its input and returns a fixed probability
pub struct FixedProbabilityModel(pub f64);

impl RiskModel for FixedProbabilityModel {
    fn model_id(&self) -> &str {
        "fixed"
    }

    fn kind(&self) -> &'static str {
        "fixed"
    }

    fn input_dim(&self) -> usize {
        FEATURE_ORDER.len()
    }

    fn predict_probability(&self, _features: &ScaledVector) -> RiskResult<f64> {
        Ok(self.0)
    }
}

pub fn identity_scaler() -> StandardScaler {
    StandardScaler::new(
        FEATURE_ORDER.iter().map(|f| f.key().to_string()).collect(),
        vec![0.0; 6],
        vec![1.0; 6],
    )
    .expect("identity scaler is valid")
}

pub fn fixed_service(probability: f64) -> ScoringService {
    let resources = LoadedResources::new(identity_scaler(), Box::new(FixedProbabilityModel(probability)))
        .expect("fixed model matches scaler width");
    ScoringService::with_defaults(Arc::new(resources))
}
