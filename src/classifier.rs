//! Probability cutoff and risk tiers.

use crate::errors::{RiskError, RiskResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability at or above which a patient is labelled high-risk
pub const DEFAULT_CUTOFF: f64 = 0.479;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    High,
    Low,
}

impl RiskTier {
    pub fn is_high(&self) -> bool {
        matches!(self, RiskTier::High)
    }

    /// One-line verdict shown under the probability
    pub fn summary(&self) -> &'static str {
        match self {
            RiskTier::High => "High risk: This patient is classified as a high-risk patient.",
            RiskTier::Low => "Low risk: This patient is classified as a low-risk patient.",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::High => f.write_str("HIGH"),
            RiskTier::Low => f.write_str("LOW"),
        }
    }
}

/// Buckets a probability into a risk tier with a fixed cutoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskClassifier {
    cutoff: f64,
}

impl RiskClassifier {
    pub fn new(cutoff: f64) -> RiskResult<Self> {
        if !cutoff.is_finite() || !(0.0..=1.0).contains(&cutoff) {
            return Err(RiskError::config(format!("cutoff must lie in [0, 1], got {cutoff}")));
        }
        Ok(Self { cutoff })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn classify(&self, probability: f64) -> RiskTier {
        classify(probability, self.cutoff)
    }
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

/// `probability >= cutoff` is high-risk
pub fn classify(probability: f64, cutoff: f64) -> RiskTier {
    if probability >= cutoff {
        RiskTier::High
    } else {
        RiskTier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_is_inclusive() {
        let classifier = RiskClassifier::default();
        assert_eq!(classifier.classify(0.479), RiskTier::High);
        assert_eq!(classifier.classify(0.4789999), RiskTier::Low);
        assert_eq!(classifier.classify(1.0), RiskTier::High);
        assert_eq!(classifier.classify(0.0), RiskTier::Low);
    }

    #[test]
    fn classification_is_monotonic() {
        let classifier = RiskClassifier::default();
        let mut seen_high = false;
        for step in 0..=1000 {
            let tier = classifier.classify(step as f64 / 1000.0);
            if seen_high {
                assert_eq!(tier, RiskTier::High, "tier fell back to LOW at step {step}");
            }
            seen_high |= tier.is_high();
        }
        assert!(seen_high);
    }

    #[test]
    fn cutoff_can_be_overridden() {
        let strict = RiskClassifier::new(0.9).unwrap();
        assert_eq!(strict.classify(0.8), RiskTier::Low);
        assert_eq!(classify(0.8, 0.5), RiskTier::High);
    }

    #[test]
    fn rejects_cutoff_outside_unit_interval() {
        assert!(RiskClassifier::new(1.5).is_err());
        assert!(RiskClassifier::new(-0.1).is_err());
        assert!(RiskClassifier::new(f64::NAN).is_err());
    }

    #[test]
    fn tier_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&RiskTier::High).unwrap(), "\"HIGH\"");
        assert_eq!(RiskTier::Low.to_string(), "LOW");
    }
}
