// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kseg_core::KsegError;

/// Similarity between two observations.
///
/// A bandwidth of exactly zero selects the linear kernel.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KernelFunction {
    /// Plain dot product.
    Linear,
    /// `exp(-||a - b||^2 / (2 * bandwidth))`; the bandwidth is a variance.
    Gaussian { bandwidth: f64 },
}

impl KernelFunction {
    /// Resolves the kernel from a configured bandwidth.
    pub fn from_bandwidth(bandwidth: f64) -> Result<Self, KsegError> {
        if !bandwidth.is_finite() || bandwidth < 0.0 {
            return Err(KsegError::invalid_config(format!(
                "kernel_bandwidth must be finite and >= 0; got {bandwidth}"
            )));
        }
        if bandwidth == 0.0 {
            Ok(Self::Linear)
        } else {
            Ok(Self::Gaussian { bandwidth })
        }
    }

    pub fn validate(&self) -> Result<(), KsegError> {
        if let Self::Gaussian { bandwidth } = *self
            && (!bandwidth.is_finite() || bandwidth <= 0.0)
        {
            return Err(KsegError::invalid_config(format!(
                "KernelFunction::Gaussian bandwidth must be finite and > 0; got {bandwidth}"
            )));
        }
        Ok(())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Gaussian { .. } => "gaussian",
        }
    }

    pub fn evaluate(&self, left: &[f64], right: &[f64]) -> f64 {
        match self {
            Self::Linear => left
                .iter()
                .zip(right.iter())
                .map(|(a, b)| a * b)
                .sum::<f64>(),
            Self::Gaussian { bandwidth } => {
                let mut dist_sq = 0.0;
                for (a, b) in left.iter().zip(right.iter()) {
                    let delta = *a - *b;
                    dist_sq += delta * delta;
                }
                (-dist_sq / (2.0 * bandwidth)).exp()
            }
        }
    }
}
