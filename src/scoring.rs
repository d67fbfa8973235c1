//! Request-level scoring: raw inputs in, probability, tier and advice out.

use crate::classifier::{RiskClassifier, RiskTier};
use crate::errors::{RiskError, RiskResult};
use crate::features::FeatureVector;
use crate::recommendations::{Recommendation, RecommendationEngine, TreatmentFlags};
use crate::resources::LoadedResources;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Inputs as supplied by the form front-end
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawInputs {
    pub lym: f64,
    pub hb: f64,
    pub alb: f64,
    #[serde(deserialize_with = "de_flag")]
    pub reperfusion_therapy: bool,
    #[serde(deserialize_with = "de_flag")]
    pub ecmo: bool,
    #[serde(deserialize_with = "de_flag")]
    pub acei_arb: bool,
    /// Used for advice only, never by the model
    #[serde(default, deserialize_with = "de_opt_flag", skip_serializing_if = "Option::is_none")]
    pub beta_blocker: Option<bool>,
    #[serde(default, deserialize_with = "de_opt_flag", skip_serializing_if = "Option::is_none")]
    pub surgery: Option<bool>,
}

impl RawInputs {
    pub fn new(lym: f64, hb: f64, alb: f64, reperfusion_therapy: bool, ecmo: bool, acei_arb: bool) -> Self {
        Self {
            lym,
            hb,
            alb,
            reperfusion_therapy,
            ecmo,
            acei_arb,
            beta_blocker: None,
            surgery: None,
        }
    }

    pub fn with_beta_blocker(mut self, given: bool) -> Self {
        self.beta_blocker = Some(given);
        self
    }

    pub fn with_surgery(mut self, given: bool) -> Self {
        self.surgery = Some(given);
        self
    }

    pub fn feature_vector(&self) -> RiskResult<FeatureVector> {
        FeatureVector::new(
            self.lym,
            self.hb,
            self.alb,
            self.reperfusion_therapy,
            self.ecmo,
            self.acei_arb,
        )
    }

    pub fn treatment_flags(&self) -> TreatmentFlags {
        TreatmentFlags {
            reperfusion_therapy: Some(self.reperfusion_therapy),
            ecmo: Some(self.ecmo),
            acei_arb: Some(self.acei_arb),
            beta_blocker: self.beta_blocker,
            surgery: self.surgery,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
}

impl FlagRepr {
    fn into_bool<E: serde::de::Error>(self) -> Result<bool, E> {
        match self {
            FlagRepr::Bool(b) => Ok(b),
            FlagRepr::Int(0) => Ok(false),
            FlagRepr::Int(1) => Ok(true),
            FlagRepr::Int(other) => Err(E::custom(format!("flag must be 0 or 1, got {other}"))),
        }
    }
}

/// Accept `true`/`false` or `1`/`0`
fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    FlagRepr::deserialize(deserializer)?.into_bool()
}

fn de_opt_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    match Option::<FlagRepr>::deserialize(deserializer)? {
        Some(flag) => flag.into_bool().map(Some),
        None => Ok(None),
    }
}

/// Outcome of one scoring request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub probability: f64,
    pub risk_tier: RiskTier,
    pub recommendations: Vec<Recommendation>,
}

impl PredictionResult {
    /// Probability as a percentage with two decimals, e.g. `"47.90%"`
    pub fn probability_percent(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }
}

/// Orchestrates scaling, prediction, classification and advice.
///
/// Holds no mutable state; a single instance can serve concurrent
/// requests behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ScoringService {
    resources: Arc<LoadedResources>,
    classifier: RiskClassifier,
    engine: RecommendationEngine,
}

impl ScoringService {
    pub fn new(resources: Arc<LoadedResources>, classifier: RiskClassifier, engine: RecommendationEngine) -> Self {
        Self {
            resources,
            classifier,
            engine,
        }
    }

    /// Service with the default cutoff and reference ranges
    pub fn with_defaults(resources: Arc<LoadedResources>) -> Self {
        Self::new(resources, RiskClassifier::default(), RecommendationEngine::default())
    }

    pub fn resources(&self) -> &LoadedResources {
        &self.resources
    }

    pub fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn score(&self, inputs: &RawInputs) -> RiskResult<PredictionResult> {
        let features = inputs.feature_vector().inspect_err(|e| {
            warn!(error = %e, "Rejected scoring input");
        })?;

        let scaled = self.resources.scaler().transform(&features)?;
        let probability = self.resources.model().predict_probability(&scaled)?;
        // NaN fails this check too
        if !(0.0..=1.0).contains(&probability) {
            return Err(RiskError::model(format!(
                "model '{}' returned probability {probability}, outside [0, 1]",
                self.resources.model().model_id()
            )));
        }
        let risk_tier = self.classifier.classify(probability);
        let recommendations = self
            .engine
            .derive_recommendations(&features, &inputs.treatment_flags(), risk_tier);

        debug!(
            model_id = self.resources.model().model_id(),
            probability,
            risk_tier = %risk_tier,
            recommendations = recommendations.len(),
            "Scored patient"
        );

        Ok(PredictionResult {
            probability,
            risk_tier,
            recommendations,
        })
    }
}
