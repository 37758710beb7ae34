// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::repro::ReproMode;
use std::borrow::Cow;

/// Diagnostics schema version for segmentation run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Counters that summarize candidate restriction during a run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruningStats {
    pub candidates_considered: usize,
    pub candidates_pruned: usize,
}

/// How candidate changepoints were chosen for one chromosome.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateSearch {
    /// Every split index was a candidate.
    Exhaustive,
    /// Candidates came from windowed-statistic peaks.
    Windowed,
}

/// Per-chromosome outcome.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ChromosomeReport {
    pub contig: String,
    pub n: usize,
    pub candidate_search: CandidateSearch,
    pub candidates: usize,
    pub change_count: usize,
    pub objective: f64,
    pub penalized_objective: f64,
}

/// Structured diagnostics captured from a segmentation run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    pub n: usize,
    pub d: usize,
    pub chromosomes: usize,
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub runtime_ms: Option<u64>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub algorithm: Cow<'static, str>,
    pub kernel: Cow<'static, str>,
    pub domain: Cow<'static, str>,
    pub seed: Option<u64>,
    pub repro_mode: ReproMode,
    pub thread_count: Option<usize>,
    #[cfg(feature = "serde")]
    pub params_json: Option<serde_json::Value>,
    pub pruning_stats: Option<PruningStats>,
    pub chromosome_reports: Vec<ChromosomeReport>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            n: 0,
            d: 0,
            chromosomes: 0,
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            runtime_ms: None,
            notes: vec![],
            warnings: vec![],
            algorithm: Cow::Borrowed(""),
            kernel: Cow::Borrowed(""),
            domain: Cow::Borrowed(""),
            seed: None,
            repro_mode: ReproMode::Balanced,
            thread_count: None,
            #[cfg(feature = "serde")]
            params_json: None,
            pruning_stats: None,
            chromosome_reports: vec![],
        }
    }
}

impl Diagnostics {
    /// Total changepoints across all chromosomes.
    pub fn total_change_count(&self) -> usize {
        self.chromosome_reports
            .iter()
            .map(|report| report.change_count)
            .sum()
    }
}
