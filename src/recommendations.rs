//! Rule-based advice for high-risk patients.
//!
//! Lab values are compared against clinical reference ranges (bounds
//! inclusive) and every collected treatment flag that is off produces a
//! fixed advisory line. Lab findings come first in schema order, then
//! treatments in the order of the advice table.

use crate::classifier::RiskTier;
use crate::errors::{RiskError, RiskResult};
use crate::features::{Feature, FeatureVector};
use serde::{Deserialize, Serialize};

/// Clinical normal interval for a lab value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub low: f64,
    pub high: f64,
}

impl ReferenceRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn status(&self, value: f64) -> RangeStatus {
        if value < self.low {
            RangeStatus::Below
        } else if value > self.high {
            RangeStatus::Above
        } else {
            RangeStatus::Within
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatus {
    Below,
    Within,
    Above,
}

/// Reference ranges for the three lab features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRanges {
    pub lym: ReferenceRange,
    pub hb: ReferenceRange,
    pub alb: ReferenceRange,
}

impl ReferenceRanges {
    pub fn get(&self, feature: Feature) -> Option<ReferenceRange> {
        match feature {
            Feature::Lym => Some(self.lym),
            Feature::Hb => Some(self.hb),
            Feature::Alb => Some(self.alb),
            _ => None,
        }
    }

    pub fn validate(&self) -> RiskResult<()> {
        for (feature, range) in [
            (Feature::Lym, self.lym),
            (Feature::Hb, self.hb),
            (Feature::Alb, self.alb),
        ] {
            if !range.low.is_finite() || !range.high.is_finite() || range.low >= range.high {
                return Err(RiskError::config(format!(
                    "reference range for '{feature}' must satisfy low < high, got [{}, {}]",
                    range.low, range.high
                )));
            }
        }
        Ok(())
    }
}

impl Default for ReferenceRanges {
    fn default() -> Self {
        Self {
            lym: ReferenceRange::new(0.8, 4.0),
            hb: ReferenceRange::new(120.0, 170.0),
            alb: ReferenceRange::new(35.0, 50.0),
        }
    }
}

/// Lab features that carry a reference range, in schema order
const LAB_FEATURES: [Feature; 3] = [Feature::Lym, Feature::Hb, Feature::Alb];

fn lab_label(feature: Feature) -> &'static str {
    match feature {
        Feature::Lym => "Lym (10^9/L)",
        Feature::Hb => "Hb (g/L)",
        Feature::Alb => "Alb (g/L)",
        _ => feature.key(),
    }
}

/// Decimal places used when printing range bounds
fn bound_precision(feature: Feature) -> usize {
    match feature {
        Feature::Lym => 1,
        _ => 0,
    }
}

/// Therapies the calculator can advise on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Treatment {
    BetaBlocker,
    AceiArb,
    Surgery,
    ReperfusionTherapy,
    Ecmo,
}

/// A treatment paired with the advice shown when it was not given
#[derive(Debug, Clone, PartialEq)]
pub struct TreatmentAdvice {
    pub treatment: Treatment,
    pub message: String,
}

impl TreatmentAdvice {
    pub fn new(treatment: Treatment, message: impl Into<String>) -> Self {
        Self {
            treatment,
            message: message.into(),
        }
    }
}

/// Built-in advice table, in display order
pub fn default_treatment_advice() -> Vec<TreatmentAdvice> {
    vec![
        TreatmentAdvice::new(Treatment::BetaBlocker, "Consider using β-receptor blocker medication."),
        TreatmentAdvice::new(Treatment::AceiArb, "Consider using ACEI/ARB medication."),
        TreatmentAdvice::new(Treatment::Surgery, "Consider undergoing surgery therapy."),
        TreatmentAdvice::new(Treatment::ReperfusionTherapy, "Consider undergoing reperfusion therapy."),
        TreatmentAdvice::new(Treatment::Ecmo, "Consider ECMO therapy for better management."),
    ]
}

/// Treatment status as collected from the caller.
///
/// `None` means the flag was never asked for; only `Some(false)` triggers
/// advice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentFlags {
    pub reperfusion_therapy: Option<bool>,
    pub ecmo: Option<bool>,
    pub acei_arb: Option<bool>,
    pub beta_blocker: Option<bool>,
    pub surgery: Option<bool>,
}

impl TreatmentFlags {
    /// Flags for the model inputs only
    pub fn from_features(features: &FeatureVector) -> Self {
        Self {
            reperfusion_therapy: Some(features.reperfusion_therapy),
            ecmo: Some(features.ecmo),
            acei_arb: Some(features.acei_arb),
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

    pub fn get(&self, treatment: Treatment) -> Option<bool> {
        match treatment {
            Treatment::BetaBlocker => self.beta_blocker,
            Treatment::AceiArb => self.acei_arb,
            Treatment::Surgery => self.surgery,
            Treatment::ReperfusionTherapy => self.reperfusion_therapy,
            Treatment::Ecmo => self.ecmo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Info,
}

/// What a recommendation was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdviceSource {
    Range { feature: Feature, status: RangeStatus },
    Treatment { treatment: Treatment },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub source: AdviceSource,
    pub message: String,
}

impl Recommendation {
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    ranges: ReferenceRanges,
    include_normal_findings: bool,
    treatments: Vec<TreatmentAdvice>,
}

impl RecommendationEngine {
    pub fn new(ranges: ReferenceRanges, include_normal_findings: bool) -> RiskResult<Self> {
        ranges.validate()?;
        Ok(Self {
            ranges,
            include_normal_findings,
            treatments: default_treatment_advice(),
        })
    }

    /// Replace the treatment advice table
    pub fn with_treatments(mut self, treatments: Vec<TreatmentAdvice>) -> Self {
        self.treatments = treatments;
        self
    }

    pub fn ranges(&self) -> &ReferenceRanges {
        &self.ranges
    }

    pub fn derive_recommendations(
        &self,
        raw: &FeatureVector,
        flags: &TreatmentFlags,
        tier: RiskTier,
    ) -> Vec<Recommendation> {
        if !tier.is_high() {
            return Vec::new();
        }

        let mut out = Vec::new();

        for feature in LAB_FEATURES {
            let Some(range) = self.ranges.get(feature) else {
                continue;
            };
            let value = raw.get(feature);
            let status = range.status(value);
            if status == RangeStatus::Within && !self.include_normal_findings {
                continue;
            }
            out.push(Recommendation {
                severity: if status == RangeStatus::Within {
                    Severity::Info
                } else {
                    Severity::Warning
                },
                source: AdviceSource::Range { feature, status },
                message: range_message(feature, value, range, status),
            });
        }

        for advice in &self.treatments {
            if flags.get(advice.treatment) == Some(false) {
                out.push(Recommendation {
                    severity: Severity::Info,
                    source: AdviceSource::Treatment {
                        treatment: advice.treatment,
                    },
                    message: advice.message.clone(),
                });
            }
        }

        out
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self {
            ranges: ReferenceRanges::default(),
            include_normal_findings: true,
            treatments: default_treatment_advice(),
        }
    }
}

fn range_message(feature: Feature, value: f64, range: ReferenceRange, status: RangeStatus) -> String {
    let label = lab_label(feature);
    let p = bound_precision(feature);
    let bounds = format!("{:.p$} - {:.p$}", range.low, range.high);
    match status {
        RangeStatus::Below => format!(
            "{label}: Your value is {value:?}. It is lower than the normal range ({bounds}). Consider increasing it towards {:.p$}.",
            range.low
        ),
        RangeStatus::Above => format!(
            "{label}: Your value is {value:?}. It is higher than the normal range ({bounds}). Consider decreasing it towards {:.p$}.",
            range.high
        ),
        RangeStatus::Within => format!("{label}: Your value is within the normal range ({bounds})."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(lym: f64, hb: f64, alb: f64) -> FeatureVector {
        FeatureVector::new(lym, hb, alb, false, false, false).unwrap()
    }

    #[test]
    fn low_tier_yields_nothing() {
        let engine = RecommendationEngine::default();
        let raw = features(0.5, 180.0, 25.0);
        let flags = TreatmentFlags::from_features(&raw)
            .with_beta_blocker(false)
            .with_surgery(false);
        assert!(engine.derive_recommendations(&raw, &flags, RiskTier::Low).is_empty());
    }

    #[test]
    fn reference_bounds_are_inclusive() {
        let engine = RecommendationEngine::default();
        for lym in [0.8, 4.0] {
            let raw = features(lym, 120.0, 50.0);
            let recs = engine.derive_recommendations(&raw, &TreatmentFlags::default(), RiskTier::High);
            assert_eq!(recs.len(), 3);
            for rec in &recs {
                assert_eq!(rec.severity, Severity::Info);
                assert!(rec.message.contains("within the normal range"), "{}", rec.message);
            }
        }
    }

    #[test]
    fn out_of_range_messages_point_at_nearest_bound() {
        let engine = RecommendationEngine::default();
        let raw = features(0.5, 180.0, 25.0);
        let recs = engine.derive_recommendations(&raw, &TreatmentFlags::default(), RiskTier::High);

        assert_eq!(
            recs[0].message,
            "Lym (10^9/L): Your value is 0.5. It is lower than the normal range (0.8 - 4.0). Consider increasing it towards 0.8."
        );
        assert_eq!(
            recs[1].message,
            "Hb (g/L): Your value is 180.0. It is higher than the normal range (120 - 170). Consider decreasing it towards 170."
        );
        assert_eq!(
            recs[2].message,
            "Alb (g/L): Your value is 25.0. It is lower than the normal range (35 - 50). Consider increasing it towards 35."
        );
        assert!(recs.iter().all(Recommendation::is_warning));
        assert_eq!(
            recs[1].source,
            AdviceSource::Range {
                feature: Feature::Hb,
                status: RangeStatus::Above
            }
        );
    }

    #[test]
    fn only_collected_flags_produce_advice() {
        let engine = RecommendationEngine::default();
        let raw = features(2.0, 140.0, 40.0);
        let flags = TreatmentFlags::from_features(&raw);
        let recs = engine.derive_recommendations(&raw, &flags, RiskTier::High);

        let treatments: Vec<&str> = recs
            .iter()
            .filter(|r| matches!(r.source, AdviceSource::Treatment { .. }))
            .map(|r| r.message.as_str())
            .collect();
        assert_eq!(
            treatments,
            vec![
                "Consider using ACEI/ARB medication.",
                "Consider undergoing reperfusion therapy.",
                "Consider ECMO therapy for better management.",
            ]
        );
    }

    #[test]
    fn extended_flags_follow_table_order() {
        let engine = RecommendationEngine::default();
        let raw = FeatureVector::new(2.0, 140.0, 40.0, true, true, false).unwrap();
        let flags = TreatmentFlags::from_features(&raw)
            .with_beta_blocker(false)
            .with_surgery(true);
        let recs = engine.derive_recommendations(&raw, &flags, RiskTier::High);
        let treatments: Vec<Treatment> = recs
            .iter()
            .filter_map(|r| match r.source {
                AdviceSource::Treatment { treatment } => Some(treatment),
                _ => None,
            })
            .collect();
        assert_eq!(treatments, vec![Treatment::BetaBlocker, Treatment::AceiArb]);
    }

    #[test]
    fn normal_findings_can_be_omitted() {
        let engine = RecommendationEngine::new(ReferenceRanges::default(), false).unwrap();
        let raw = features(2.0, 100.0, 40.0);
        let recs = engine.derive_recommendations(&raw, &TreatmentFlags::default(), RiskTier::High);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].message.starts_with("Hb (g/L): Your value is 100.0. It is lower"));
    }

    #[test]
    fn custom_advice_table_is_used() {
        let engine = RecommendationEngine::default().with_treatments(vec![TreatmentAdvice::new(
            Treatment::Ecmo,
            "Discuss mechanical circulatory support.",
        )]);
        let raw = features(2.0, 140.0, 40.0);
        let recs = engine.derive_recommendations(&raw, &TreatmentFlags::from_features(&raw), RiskTier::High);
        assert_eq!(recs.last().unwrap().message, "Discuss mechanical circulatory support.");
        assert_eq!(recs.len(), 4);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut ranges = ReferenceRanges::default();
        ranges.alb = ReferenceRange::new(50.0, 35.0);
        assert!(matches!(
            RecommendationEngine::new(ranges, true),
            Err(RiskError::Config { .. })
        ));
    }
}
