//! On-disk configuration and output documents.
//!
//! The config is a YAML document with a `model` section (exactly the eight
//! model keys; anything missing or unknown is fatal) and a `settings`
//! section (stopping conditions plus replicate-keeping policies). Parsed
//! values are echoed verbatim into the output document, so a run's inputs
//! travel with its trees.

// Traits
use serde::{Deserialize, Serialize};

// Functions
use std::path::Path;

use crate::errors::ConfigError;
use crate::model::{SdsdModel, StoppingConditions};

/// Top-level config document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    pub model: ModelConfig,
    pub settings: SettingsConfig,
}

impl SimConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_yaml::from_str(text)?;
        config.settings.stopping_conditions.validate()?;
        Ok(config)
    }
}

/// The `model` section; mirrors [`SdsdModel`] field for field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub q: Vec<Vec<f64>>,
    pub birth_rates: Vec<f64>,
    pub death_rates: Vec<f64>,
    pub burst_rate: f64,
    pub burst_probs: Vec<f64>,
    pub burst_furcation_poisson_means: Vec<f64>,
    pub burst_furcation_poisson_shifts: Vec<u64>,
    pub only_bifurcate: bool,
}

impl ModelConfig {
    /// Vet the parameterization and build the simulation model.
    pub fn build(&self) -> Result<SdsdModel, ConfigError> {
        let model = SdsdModel::new(
            self.q.clone(),
            self.birth_rates.clone(),
            self.death_rates.clone(),
            self.burst_rate,
            self.burst_probs.clone(),
            self.burst_furcation_poisson_means.clone(),
            self.burst_furcation_poisson_shifts.clone(),
            self.only_bifurcate,
        )?;
        Ok(model)
    }
}

/// The `settings` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsConfig {
    #[serde(default)]
    pub stopping_conditions: StoppingConditions,
    /// Keep replicates whose population went extinct.
    #[serde(default)]
    pub keep_extinct_trees: bool,
    /// Store each tree with its all-extinct clades pruned away.
    #[serde(default)]
    pub prune_extinct_leaves: bool,
    /// Discard replicates whose final leaf counts overshoot a threshold
    /// (a burst can add several leaves in one event).
    #[serde(default)]
    pub max_leaves_strict: bool,
}

/// The document written to stdout after a run.
#[derive(Clone, Debug, Serialize)]
pub struct SimOutput {
    #[serde(rename = "SDSDsim_version")]
    pub version: String,
    pub seed: u64,
    pub model: ModelConfig,
    pub settings: SettingsConfig,
    pub trees: Vec<TreeSample>,
}

/// One stored replicate.
#[derive(Clone, Debug, Serialize)]
pub struct TreeSample {
    /// SimMap Newick string, root annotations included.
    pub tree: String,
    pub burst_times: Vec<f64>,
}
