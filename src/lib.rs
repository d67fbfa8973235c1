//! Library root for the `shockrisk` crate
//! One-year mortality risk scoring for acute myocardial infarction with cardiogenic shock

// Core error handling
pub mod errors;

// Feature schema & scaling
pub mod features;
pub mod scaler;

// Models
pub mod gbm;
pub mod risk_linear;
pub mod risk_model;

// Classification & advice
pub mod classifier;
pub mod recommendations;

// Startup resources & request scoring
pub mod resources;
pub mod scoring;

// Configuration & CLI
pub mod cli;
pub mod config;
pub mod config_loader;

// Web server interface
pub mod web;

pub use classifier::{RiskClassifier, RiskTier, DEFAULT_CUTOFF};
pub use errors::{RiskError, RiskResult};
pub use features::{Feature, FeatureVector, ScaledVector, FEATURE_ORDER};
pub use recommendations::{Recommendation, RecommendationEngine, TreatmentFlags};
pub use resources::LoadedResources;
pub use risk_model::RiskModel;
pub use scaler::StandardScaler;
pub use scoring::{PredictionResult, RawInputs, ScoringService};
