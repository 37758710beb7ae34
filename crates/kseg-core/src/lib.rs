// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod control;
pub mod data;
pub mod diagnostics;
pub mod dictionary;
pub mod error;
pub mod execution_context;
pub mod interval;
pub mod numerics;
pub mod observability;
pub mod partition;
pub mod repro;

pub use control::CancelToken;
pub use data::{AllelicCount, CopyRatio, DataPoint};
pub use diagnostics::{
    CandidateSearch, ChromosomeReport, DIAGNOSTICS_SCHEMA_VERSION, Diagnostics, PruningStats,
};
pub use dictionary::ContigOrder;
pub use error::KsegError;
pub use execution_context::ExecutionContext;
pub use interval::GenomicInterval;
pub use numerics::{KahanSum, prefix_sums, prefix_sums_kahan};
pub use observability::{ProgressSink, TelemetrySink};
pub use partition::{ChromosomeBlock, partition_by_contig};
pub use repro::ReproMode;
