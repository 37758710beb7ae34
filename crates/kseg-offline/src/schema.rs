// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::{
    DEFAULT_APPROXIMATION_DIMENSION, DEFAULT_CANCEL_CHECK_EVERY, DEFAULT_CANDIDATE_NEIGHBORHOOD,
    DEFAULT_EXHAUSTIVE_SEARCH_LIMIT, DEFAULT_KERNEL_BANDWIDTH, DEFAULT_LINEAR_PENALTY_FACTOR,
    DEFAULT_LOG_LINEAR_PENALTY_FACTOR, DEFAULT_MAX_CHANGEPOINTS_PER_CHROMOSOME, DEFAULT_SEED,
    DEFAULT_WINDOW_SIZES, SegmentationConfig,
};
use crate::merge::GapPolicy;
use kseg_core::KsegError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current version of the configuration wire format.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

pub type UnknownFields = Map<String, Value>;

/// Versioned wire format for [`SegmentationConfig`].
///
/// Missing fields take their defaults; unrecognized fields are preserved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfigWire {
    pub schema_version: u32,
    #[serde(default = "default_max_changepoints")]
    pub max_changepoints_per_chromosome: usize,
    #[serde(default = "default_kernel_bandwidth")]
    pub kernel_bandwidth: f64,
    #[serde(default = "default_approximation_dimension")]
    pub approximation_dimension: usize,
    #[serde(default = "default_window_sizes")]
    pub window_sizes: Vec<usize>,
    #[serde(default = "default_linear_penalty_factor")]
    pub linear_penalty_factor: f64,
    #[serde(default = "default_log_linear_penalty_factor")]
    pub log_linear_penalty_factor: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_exhaustive_search_limit")]
    pub exhaustive_search_limit: usize,
    #[serde(default = "default_candidate_neighborhood")]
    pub candidate_neighborhood: usize,
    #[serde(default)]
    pub max_candidates: Option<usize>,
    #[serde(default)]
    pub gap_policy: GapPolicy,
    #[serde(default = "default_cancel_check_every")]
    pub cancel_check_every: usize,
    #[serde(default, flatten)]
    pub unknown_fields: UnknownFields,
}

fn default_max_changepoints() -> usize {
    DEFAULT_MAX_CHANGEPOINTS_PER_CHROMOSOME
}

fn default_kernel_bandwidth() -> f64 {
    DEFAULT_KERNEL_BANDWIDTH
}

fn default_approximation_dimension() -> usize {
    DEFAULT_APPROXIMATION_DIMENSION
}

fn default_window_sizes() -> Vec<usize> {
    DEFAULT_WINDOW_SIZES.to_vec()
}

fn default_linear_penalty_factor() -> f64 {
    DEFAULT_LINEAR_PENALTY_FACTOR
}

fn default_log_linear_penalty_factor() -> f64 {
    DEFAULT_LOG_LINEAR_PENALTY_FACTOR
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_exhaustive_search_limit() -> usize {
    DEFAULT_EXHAUSTIVE_SEARCH_LIMIT
}

fn default_candidate_neighborhood() -> usize {
    DEFAULT_CANDIDATE_NEIGHBORHOOD
}

fn default_cancel_check_every() -> usize {
    DEFAULT_CANCEL_CHECK_EVERY
}

impl SegmentationConfigWire {
    pub fn from_runtime(config: SegmentationConfig) -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            max_changepoints_per_chromosome: config.max_changepoints_per_chromosome,
            kernel_bandwidth: config.kernel_bandwidth,
            approximation_dimension: config.approximation_dimension,
            window_sizes: config.window_sizes,
            linear_penalty_factor: config.linear_penalty_factor,
            log_linear_penalty_factor: config.log_linear_penalty_factor,
            seed: config.seed,
            exhaustive_search_limit: config.exhaustive_search_limit,
            candidate_neighborhood: config.candidate_neighborhood,
            max_candidates: config.max_candidates,
            gap_policy: config.gap_policy,
            cancel_check_every: config.cancel_check_every,
            unknown_fields: UnknownFields::new(),
        }
    }

    /// Validates the schema version and the configuration values.
    pub fn into_runtime_parts(self) -> Result<(SegmentationConfig, UnknownFields), KsegError> {
        if self.schema_version == 0 || self.schema_version > CONFIG_SCHEMA_VERSION {
            return Err(KsegError::invalid_config(format!(
                "unsupported SegmentationConfig schema_version={}; supported: 1..={CONFIG_SCHEMA_VERSION}",
                self.schema_version
            )));
        }
        let config = SegmentationConfig {
            max_changepoints_per_chromosome: self.max_changepoints_per_chromosome,
            kernel_bandwidth: self.kernel_bandwidth,
            approximation_dimension: self.approximation_dimension,
            window_sizes: self.window_sizes,
            linear_penalty_factor: self.linear_penalty_factor,
            log_linear_penalty_factor: self.log_linear_penalty_factor,
            seed: self.seed,
            exhaustive_search_limit: self.exhaustive_search_limit,
            candidate_neighborhood: self.candidate_neighborhood,
            max_candidates: self.max_candidates,
            gap_policy: self.gap_policy,
            cancel_check_every: self.cancel_check_every,
        };
        config.validate()?;
        Ok((config, self.unknown_fields))
    }

    pub fn to_runtime(self) -> Result<SegmentationConfig, KsegError> {
        let (config, _) = self.into_runtime_parts()?;
        Ok(config)
    }
}

/// Parses and validates a JSON configuration document.
pub fn config_from_json_str(json: &str) -> Result<SegmentationConfig, KsegError> {
    let wire: SegmentationConfigWire = serde_json::from_str(json)
        .map_err(|err| KsegError::invalid_config(format!("malformed config JSON: {err}")))?;
    let (config, unknown_fields) = wire.into_runtime_parts()?;
    if !unknown_fields.is_empty() {
        let names: Vec<&str> = unknown_fields.keys().map(String::as_str).collect();
        log::warn!("ignoring unknown config fields: {}", names.join(", "));
    }
    Ok(config)
}

/// Serializes a configuration with the current schema version.
pub fn config_to_json_string(config: &SegmentationConfig) -> Result<String, KsegError> {
    serde_json::to_string_pretty(&SegmentationConfigWire::from_runtime(config.clone()))
        .map_err(|err| KsegError::invalid_config(format!("cannot serialize config: {err}")))
}

impl SegmentationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, KsegError> {
        config_from_json_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, KsegError> {
        config_to_json_string(self)
    }
}
