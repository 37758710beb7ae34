// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::merge::GapPolicy;
use kseg_core::KsegError;
use kseg_costs::KernelFunction;

pub const DEFAULT_MAX_CHANGEPOINTS_PER_CHROMOSOME: usize = 100;
pub const DEFAULT_KERNEL_BANDWIDTH: f64 = 0.0;
pub const DEFAULT_APPROXIMATION_DIMENSION: usize = 100;
pub const DEFAULT_WINDOW_SIZES: [usize; 6] = [8, 16, 32, 64, 128, 256];
pub const DEFAULT_LINEAR_PENALTY_FACTOR: f64 = 1.0;
pub const DEFAULT_LOG_LINEAR_PENALTY_FACTOR: f64 = 1.0;
pub const DEFAULT_SEED: u64 = 1;
pub const DEFAULT_EXHAUSTIVE_SEARCH_LIMIT: usize = 1000;
pub const DEFAULT_CANDIDATE_NEIGHBORHOOD: usize = 2;
pub const DEFAULT_CANCEL_CHECK_EVERY: usize = 1000;

/// Configuration for [`crate::KernelSegmenter`].
///
/// Blocks with at most `exhaustive_search_limit` points consider every split
/// index, so the optimizer returns the exact optimum. Larger blocks restrict
/// candidates to windowed-statistic peaks.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationConfig {
    pub max_changepoints_per_chromosome: usize,
    /// Gaussian kernel variance; `0.0` selects the linear kernel.
    pub kernel_bandwidth: f64,
    pub approximation_dimension: usize,
    pub window_sizes: Vec<usize>,
    pub linear_penalty_factor: f64,
    pub log_linear_penalty_factor: f64,
    pub seed: u64,
    pub exhaustive_search_limit: usize,
    pub candidate_neighborhood: usize,
    pub max_candidates: Option<usize>,
    pub gap_policy: GapPolicy,
    pub cancel_check_every: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_changepoints_per_chromosome: DEFAULT_MAX_CHANGEPOINTS_PER_CHROMOSOME,
            kernel_bandwidth: DEFAULT_KERNEL_BANDWIDTH,
            approximation_dimension: DEFAULT_APPROXIMATION_DIMENSION,
            window_sizes: DEFAULT_WINDOW_SIZES.to_vec(),
            linear_penalty_factor: DEFAULT_LINEAR_PENALTY_FACTOR,
            log_linear_penalty_factor: DEFAULT_LOG_LINEAR_PENALTY_FACTOR,
            seed: DEFAULT_SEED,
            exhaustive_search_limit: DEFAULT_EXHAUSTIVE_SEARCH_LIMIT,
            candidate_neighborhood: DEFAULT_CANDIDATE_NEIGHBORHOOD,
            max_candidates: None,
            gap_policy: GapPolicy::default(),
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        }
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<(), KsegError> {
        KernelFunction::from_bandwidth(self.kernel_bandwidth)?;

        if self.approximation_dimension == 0 {
            return Err(KsegError::invalid_config(
                "approximation_dimension must be >= 1; got 0",
            ));
        }

        if self.window_sizes.is_empty() {
            return Err(KsegError::invalid_config("window_sizes must be non-empty"));
        }
        if let Some(position) = self.window_sizes.iter().position(|&w| w == 0) {
            return Err(KsegError::invalid_config(format!(
                "window_sizes must be positive; window_sizes[{position}]=0"
            )));
        }
        if let Some(pair) = self
            .window_sizes
            .windows(2)
            .find(|pair| pair[0] >= pair[1])
        {
            return Err(KsegError::invalid_config(format!(
                "window_sizes must be strictly ascending; got {} before {}",
                pair[0], pair[1]
            )));
        }

        for (name, value) in [
            ("linear_penalty_factor", self.linear_penalty_factor),
            ("log_linear_penalty_factor", self.log_linear_penalty_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(KsegError::invalid_config(format!(
                    "{name} must be finite and >= 0; got {value}"
                )));
            }
        }

        if self.max_candidates == Some(0) && self.max_changepoints_per_chromosome > 0 {
            return Err(KsegError::invalid_config(
                "max_candidates must be >= 1 when changepoints are allowed; got 0",
            ));
        }
        Ok(())
    }

    pub fn kernel(&self) -> Result<KernelFunction, KsegError> {
        KernelFunction::from_bandwidth(self.kernel_bandwidth)
    }

    pub(crate) fn normalized_cancel_check_every(&self) -> usize {
        self.cancel_check_every.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_WINDOW_SIZES, SegmentationConfig};
    use crate::merge::GapPolicy;
    use kseg_costs::KernelFunction;

    #[test]
    fn defaults_are_valid() {
        let config = SegmentationConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.window_sizes, DEFAULT_WINDOW_SIZES.to_vec());
        assert_eq!(config.gap_policy, GapPolicy::Close);
        assert_eq!(config.kernel().expect("valid"), KernelFunction::Linear);
        assert!(config.max_candidates.is_none());
    }

    #[test]
    fn cancel_check_every_zero_is_normalized() {
        let config = SegmentationConfig {
            cancel_check_every: 0,
            ..SegmentationConfig::default()
        };
        config.validate().expect("zero cadence is allowed");
        assert_eq!(config.normalized_cancel_check_every(), 1);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases: Vec<(SegmentationConfig, &str)> = vec![
            (
                SegmentationConfig {
                    kernel_bandwidth: -0.1,
                    ..SegmentationConfig::default()
                },
                "kernel_bandwidth",
            ),
            (
                SegmentationConfig {
                    approximation_dimension: 0,
                    ..SegmentationConfig::default()
                },
                "approximation_dimension",
            ),
            (
                SegmentationConfig {
                    window_sizes: vec![],
                    ..SegmentationConfig::default()
                },
                "non-empty",
            ),
            (
                SegmentationConfig {
                    window_sizes: vec![8, 0, 16],
                    ..SegmentationConfig::default()
                },
                "positive",
            ),
            (
                SegmentationConfig {
                    window_sizes: vec![8, 32, 16],
                    ..SegmentationConfig::default()
                },
                "strictly ascending",
            ),
            (
                SegmentationConfig {
                    window_sizes: vec![8, 8],
                    ..SegmentationConfig::default()
                },
                "strictly ascending",
            ),
            (
                SegmentationConfig {
                    linear_penalty_factor: -1.0,
                    ..SegmentationConfig::default()
                },
                "linear_penalty_factor",
            ),
            (
                SegmentationConfig {
                    log_linear_penalty_factor: f64::NAN,
                    ..SegmentationConfig::default()
                },
                "log_linear_penalty_factor",
            ),
            (
                SegmentationConfig {
                    max_candidates: Some(0),
                    ..SegmentationConfig::default()
                },
                "max_candidates",
            ),
        ];

        for (config, fragment) in cases {
            let err = config.validate().expect_err("invalid config must fail");
            let message = err.to_string();
            assert!(message.starts_with("invalid config"), "{message}");
            assert!(message.contains(fragment), "{message} lacks {fragment}");
        }
    }

    #[test]
    fn zero_penalties_and_zero_changepoints_are_valid() {
        let config = SegmentationConfig {
            max_changepoints_per_chromosome: 0,
            linear_penalty_factor: 0.0,
            log_linear_penalty_factor: 0.0,
            max_candidates: Some(0),
            ..SegmentationConfig::default()
        };
        config.validate().expect("zero values are in range");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_serde_roundtrip() {
        let config = SegmentationConfig {
            kernel_bandwidth: 0.05,
            window_sizes: vec![8, 16, 32, 64],
            max_candidates: Some(400),
            gap_policy: GapPolicy::Close,
            ..SegmentationConfig::default()
        };
        let encoded = serde_json::to_string(&config).expect("config should serialize");
        let decoded: SegmentationConfig =
            serde_json::from_str(&encoded).expect("config should deserialize");
        assert_eq!(decoded, config);
    }
}
