// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kseg_core::{AllelicCount, CopyRatio, KsegError};

/// Maps a domain payload to the real-valued input of the feature approximator.
pub trait DomainAdapter: Send + Sync {
    type Value: Sync;

    fn name(&self) -> &'static str;

    fn input_dimension(&self) -> usize {
        1
    }

    /// Writes `input_dimension()` finite values describing `value` into `out`.
    fn to_feature_input(&self, value: &Self::Value, out: &mut [f64]) -> Result<(), KsegError>;
}

/// Segments denoised log2 copy ratios.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CopyRatioAdapter;

impl DomainAdapter for CopyRatioAdapter {
    type Value = CopyRatio;

    fn name(&self) -> &'static str {
        "copy_ratio"
    }

    fn to_feature_input(&self, value: &CopyRatio, out: &mut [f64]) -> Result<(), KsegError> {
        if !value.log2_copy_ratio.is_finite() {
            return Err(KsegError::invalid_input(format!(
                "log2 copy ratio must be finite; got {}",
                value.log2_copy_ratio
            )));
        }
        out[0] = value.log2_copy_ratio;
        Ok(())
    }
}

/// Segments allelic counts by their minor-allele fraction.
///
/// Folding to `min(ref, alt) / (ref + alt)` makes a site reading 45% alt and
/// one reading 55% alt the same state, so allele phase does not create
/// spurious changepoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlleleFractionAdapter;

impl DomainAdapter for AlleleFractionAdapter {
    type Value = AllelicCount;

    fn name(&self) -> &'static str {
        "allele_fraction"
    }

    fn to_feature_input(&self, value: &AllelicCount, out: &mut [f64]) -> Result<(), KsegError> {
        let Some(fraction) = value.minor_allele_fraction() else {
            return Err(KsegError::invalid_input(
                "allelic count has zero total depth (ref_count=0, alt_count=0)",
            ));
        };
        out[0] = fraction;
        Ok(())
    }
}
