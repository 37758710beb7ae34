// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod adapters;
pub mod config;
pub mod dynp;
pub mod merge;
#[cfg(feature = "serde")]
pub mod schema;
pub mod segmenter;
pub mod window;

pub use adapters::{AlleleFractionAdapter, CopyRatioAdapter, DomainAdapter};
pub use config::SegmentationConfig;
pub use dynp::{DynpParams, DynpSelection, changepoint_penalty, segment_penalized};
pub use merge::{GapPolicy, merge_segments};
#[cfg(feature = "serde")]
pub use schema::{SegmentationConfigWire, config_from_json_str, config_to_json_string};
pub use segmenter::{KernelSegmenter, SegmentationResult, segment_ordered_signal};
pub use window::{CandidateSelection, all_splits, combined_scores, select_candidates, window_scores};
