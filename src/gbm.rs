//! Gradient-boosted decision tree ensemble.
//!
//! Trees are stored as flat node arrays. A split sends a sample left when
//! `x[feature] <= threshold`. Child indices always point forward, so a
//! walk from the root visits each node at most once.

use crate::errors::{RiskError, RiskResult};
use crate::features::ScaledVector;
use crate::risk_model::{check_input_dim, probability_from_logit, ModelMetadata, RiskModel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    /// Depth-one tree on a single feature
    pub fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Self {
        Self::new(vec![
            TreeNode::Split {
                feature,
                threshold,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf { value: left },
            TreeNode::Leaf { value: right },
        ])
    }

    fn validate(&self, tree_index: usize, n_features: usize) -> RiskResult<()> {
        if self.nodes.is_empty() {
            return Err(RiskError::config(format!("tree {tree_index} has no nodes")));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(RiskError::config(format!(
                            "tree {tree_index} node {i} splits on feature {feature}, model has {n_features}"
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(RiskError::config(format!(
                            "tree {tree_index} node {i} has a NaN threshold"
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(RiskError::config(format!(
                                "tree {tree_index} node {i} has invalid child index {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(RiskError::config(format!(
                            "tree {tree_index} leaf {i} has a non-finite value"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Leaf value reached by `x`
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut index = 0;
        // Children point forward, so this terminates within nodes.len() steps.
        while let Some(node) = self.nodes.get(index) {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = x.get(*feature).copied().unwrap_or(f64::NAN);
                    // NaN goes right
                    index = if value <= *threshold { *left } else { *right };
                }
            }
        }
        0.0
    }
}

/// Binary gradient boosting classifier with log-loss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedModel {
    pub model_id: String,
    pub n_features: usize,
    /// Prior log-odds of the positive class
    pub init_score: f64,
    pub learning_rate: f64,
    pub trees: Vec<RegressionTree>,
    #[serde(flatten)]
    pub metadata: ModelMetadata,
}

impl GradientBoostedModel {
    pub fn new(
        model_id: impl Into<String>,
        n_features: usize,
        init_score: f64,
        learning_rate: f64,
        trees: Vec<RegressionTree>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            n_features,
            init_score,
            learning_rate,
            trees,
            metadata: ModelMetadata::default(),
        }
    }

    pub fn validate(&self) -> RiskResult<()> {
        if self.n_features == 0 {
            return Err(RiskError::config(format!(
                "model '{}' declares zero features",
                self.model_id
            )));
        }
        if !self.init_score.is_finite() || !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(RiskError::config(format!(
                "model '{}' needs a finite init_score and a positive learning_rate",
                self.model_id
            )));
        }
        if self.trees.is_empty() {
            return Err(RiskError::config(format!("model '{}' has no trees", self.model_id)));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.n_features)?;
        }
        Ok(())
    }

    /// Raw log-odds before the logistic link
    pub fn decision_function(&self, features: &ScaledVector) -> f64 {
        let x = features.as_slice();
        let boost: f64 = self.trees.iter().map(|tree| tree.predict(x)).sum();
        self.init_score + self.learning_rate * boost
    }
}

impl RiskModel for GradientBoostedModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn kind(&self) -> &'static str {
        "gradient_boosting"
    }

    fn input_dim(&self) -> usize {
        self.n_features
    }

    fn predict_probability(&self, features: &ScaledVector) -> RiskResult<f64> {
        check_input_dim(self, features)?;
        probability_from_logit(&self.model_id, self.decision_function(features))
    }
}
