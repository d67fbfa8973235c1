//! Fixed feature schema for the mortality model.
//!
//! The scaler and the model were fit on columns in exactly this order.
//! Everything that crosses into numeric space goes through
//! [`FeatureVector::to_array`] so the order lives in one place.

use crate::errors::{RiskError, RiskResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of model inputs
pub const NUM_FEATURES: usize = 6;

/// Column order the artifacts were fit with
pub const FEATURE_ORDER: [Feature; NUM_FEATURES] = [
    Feature::Lym,
    Feature::Hb,
    Feature::Alb,
    Feature::ReperfusionTherapy,
    Feature::Ecmo,
    Feature::AceiArb,
];

/// A single model input column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Lym,
    Hb,
    Alb,
    ReperfusionTherapy,
    Ecmo,
    AceiArb,
}

impl Feature {
    /// Schema key used in artifacts and request bodies
    pub fn key(&self) -> &'static str {
        match self {
            Feature::Lym => "lym",
            Feature::Hb => "hb",
            Feature::Alb => "alb",
            Feature::ReperfusionTherapy => "reperfusion_therapy",
            Feature::Ecmo => "ecmo",
            Feature::AceiArb => "acei_arb",
        }
    }

    pub fn from_key(key: &str) -> Option<Feature> {
        FEATURE_ORDER.iter().copied().find(|f| f.key() == key)
    }

    /// Position of this column in [`FEATURE_ORDER`]
    pub fn index(&self) -> usize {
        match self {
            Feature::Lym => 0,
            Feature::Hb => 1,
            Feature::Alb => 2,
            Feature::ReperfusionTherapy => 3,
            Feature::Ecmo => 4,
            Feature::AceiArb => 5,
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(
            self,
            Feature::ReperfusionTherapy | Feature::Ecmo | Feature::AceiArb
        )
    }

    /// Inclusive input domain, matching the calculator's widget ranges
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Feature::Lym => (0.0, 8.0),
            Feature::Hb => (0.0, 200.0),
            Feature::Alb => (0.0, 50.0),
            Feature::ReperfusionTherapy | Feature::Ecmo | Feature::AceiArb => (0.0, 1.0),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw, unscaled model inputs in schema order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub lym: f64,
    pub hb: f64,
    pub alb: f64,
    pub reperfusion_therapy: bool,
    pub ecmo: bool,
    pub acei_arb: bool,
}

impl FeatureVector {
    /// Build a vector, rejecting values outside the input domain.
    pub fn new(
        lym: f64,
        hb: f64,
        alb: f64,
        reperfusion_therapy: bool,
        ecmo: bool,
        acei_arb: bool,
    ) -> RiskResult<Self> {
        let vector = Self {
            lym,
            hb,
            alb,
            reperfusion_therapy,
            ecmo,
            acei_arb,
        };
        vector.validate()?;
        Ok(vector)
    }

    /// Build a vector from a name -> value map.
    ///
    /// Every schema key must be present exactly once; unknown keys are
    /// rejected rather than dropped and flags must be 0 or 1.
    pub fn from_named(values: &BTreeMap<String, f64>) -> RiskResult<Self> {
        if let Some(unknown) = values.keys().find(|k| Feature::from_key(k).is_none()) {
            return Err(RiskError::validation(
                unknown.as_str(),
                "not part of the feature schema",
            ));
        }

        let mut ordered = [0.0; NUM_FEATURES];
        for feature in FEATURE_ORDER {
            let value = values
                .get(feature.key())
                .copied()
                .ok_or_else(|| RiskError::validation(feature.key(), "missing feature"))?;
            ordered[feature.index()] = value;
        }

        let flag = |feature: Feature| -> RiskResult<bool> {
            let value = ordered[feature.index()];
            if value == 0.0 {
                Ok(false)
            } else if value == 1.0 {
                Ok(true)
            } else {
                Err(RiskError::validation(feature.key(), "flag must be 0 or 1"))
            }
        };

        Self::new(
            ordered[Feature::Lym.index()],
            ordered[Feature::Hb.index()],
            ordered[Feature::Alb.index()],
            flag(Feature::ReperfusionTherapy)?,
            flag(Feature::Ecmo)?,
            flag(Feature::AceiArb)?,
        )
    }

    pub fn validate(&self) -> RiskResult<()> {
        for feature in [Feature::Lym, Feature::Hb, Feature::Alb] {
            let value = self.get(feature);
            let (low, high) = feature.bounds();
            if !value.is_finite() {
                return Err(RiskError::validation(feature.key(), "must be a finite number"));
            }
            if value < low || value > high {
                return Err(RiskError::validation(
                    feature.key(),
                    format!("{value} is outside the accepted range [{low}, {high}]"),
                ));
            }
        }
        Ok(())
    }

    /// Value of one column, flags as 0.0 / 1.0
    pub fn get(&self, feature: Feature) -> f64 {
        self.to_array()[feature.index()]
    }

    /// Values in [`FEATURE_ORDER`]
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.lym,
            self.hb,
            self.alb,
            flag_value(self.reperfusion_therapy),
            flag_value(self.ecmo),
            flag_value(self.acei_arb),
        ]
    }
}

fn flag_value(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Standardized feature values, produced only by the scaler
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledVector(Vec<f64>);

impl ScaledVector {
    pub(crate) fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}
