// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod cost;
pub mod features;
pub mod kernel;

pub use cost::{DispersionCache, FeatureMatrix, SegmentCost};
pub use features::FeatureApproximator;
pub use kernel::KernelFunction;
