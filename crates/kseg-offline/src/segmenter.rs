// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::adapters::{AlleleFractionAdapter, CopyRatioAdapter, DomainAdapter};
use crate::config::SegmentationConfig;
use crate::dynp::{DynpParams, segment_penalized};
use crate::merge::merge_segments;
use crate::window::{CandidateSelection, all_splits, select_candidates};
use kseg_core::{
    CandidateSearch, ChromosomeBlock, ChromosomeReport, ContigOrder, DataPoint, Diagnostics,
    ExecutionContext, GenomicInterval, KsegError, PruningStats, ReproMode, partition_by_contig,
};
use kseg_costs::{DispersionCache, FeatureApproximator};
use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Segments of every chromosome, in input order, plus run metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationResult {
    pub segments: Vec<GenomicInterval>,
    pub diagnostics: Diagnostics,
}

/// Kernel changepoint segmenter for one signal type.
#[derive(Clone, Debug)]
pub struct KernelSegmenter<A: DomainAdapter> {
    adapter: A,
    config: SegmentationConfig,
}

impl KernelSegmenter<CopyRatioAdapter> {
    pub fn copy_ratio(config: SegmentationConfig) -> Result<Self, KsegError> {
        Self::new(CopyRatioAdapter, config)
    }
}

impl KernelSegmenter<AlleleFractionAdapter> {
    pub fn allele_fraction(config: SegmentationConfig) -> Result<Self, KsegError> {
        Self::new(AlleleFractionAdapter, config)
    }
}

impl<A: DomainAdapter> KernelSegmenter<A> {
    pub fn new(adapter: A, config: SegmentationConfig) -> Result<Self, KsegError> {
        config.validate()?;
        Ok(Self { adapter, config })
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    pub fn segment(
        &self,
        points: &[DataPoint<A::Value>],
        contig_order: Option<&ContigOrder>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<SegmentationResult, KsegError> {
        segment_ordered_signal(points, &self.adapter, &self.config, contig_order, ctx)
    }
}

struct BlockOutcome {
    segments: Vec<GenomicInterval>,
    report: ChromosomeReport,
    considered: usize,
    pruned: usize,
}

#[cfg(feature = "rayon")]
fn can_use_parallel(ctx: &ExecutionContext<'_>, block_count: usize) -> bool {
    ctx.repro_mode.allows_parallelism() && block_count > 1
}

fn tag_point_error(err: KsegError, index: usize, interval: &GenomicInterval) -> KsegError {
    match err {
        KsegError::InvalidInput(message) => {
            KsegError::invalid_input(format!("point {index} at {interval}: {message}"))
        }
        other => other,
    }
}

fn segment_block<A: DomainAdapter>(
    block: &ChromosomeBlock<'_, A::Value>,
    adapter: &A,
    approximator: &FeatureApproximator,
    config: &SegmentationConfig,
    ctx: &ExecutionContext<'_>,
    started_at: Instant,
) -> Result<BlockOutcome, KsegError> {
    ctx.check_cancelled()?;
    ctx.check_time_budget(started_at)?;

    let dim = adapter.input_dimension();
    let mut inputs = vec![0.0; block.len() * dim];
    for (i, (point, out)) in block
        .points()
        .iter()
        .zip(inputs.chunks_exact_mut(dim))
        .enumerate()
    {
        adapter
            .to_feature_input(&point.value, out)
            .map_err(|err| tag_point_error(err, block.offset() + i, &point.interval))?;
    }

    let features = approximator.featurize(&inputs)?;
    let cache = DispersionCache::new(&features, ctx.repro_mode)?;
    let n = block.len();

    let (candidate_search, selection) = if n <= config.exhaustive_search_limit {
        (CandidateSearch::Exhaustive, all_splits(n))
    } else {
        let selection: CandidateSelection = select_candidates(
            &cache,
            &config.window_sizes,
            config.max_changepoints_per_chromosome,
            config.candidate_neighborhood,
            config.max_candidates,
            ctx,
            started_at,
        )?;
        (CandidateSearch::Windowed, selection)
    };

    let params = DynpParams {
        max_changepoints: config.max_changepoints_per_chromosome,
        linear_penalty_factor: config.linear_penalty_factor,
        log_linear_penalty_factor: config.log_linear_penalty_factor,
        cancel_check_every: config.normalized_cancel_check_every(),
    };
    let dynp = segment_penalized(&cache, &selection.candidates, &params, ctx, started_at)?;
    let segments = merge_segments(block, &dynp.changepoints, config.gap_policy)?;

    log::debug!(
        "contig {}: n={n}, search={candidate_search:?}, candidates={}, changepoints={}",
        block.contig(),
        selection.candidates.len(),
        dynp.change_count()
    );

    Ok(BlockOutcome {
        segments,
        report: ChromosomeReport {
            contig: block.contig().to_string(),
            n,
            candidate_search,
            candidates: selection.candidates.len(),
            change_count: dynp.change_count(),
            objective: dynp.objective,
            penalized_objective: dynp.penalized_objective,
        },
        considered: selection.considered,
        pruned: selection.pruned,
    })
}

/// Segments an ordered genomic signal into regions of constant behaviour.
///
/// Points must be grouped by contig and, within a contig, sorted and
/// non-overlapping. Each chromosome is segmented independently; the output
/// lists every chromosome's segments in input order.
pub fn segment_ordered_signal<A: DomainAdapter>(
    points: &[DataPoint<A::Value>],
    adapter: &A,
    config: &SegmentationConfig,
    contig_order: Option<&ContigOrder>,
    ctx: &ExecutionContext<'_>,
) -> Result<SegmentationResult, KsegError> {
    config.validate()?;
    let started_at = Instant::now();

    let kernel = config.kernel()?;
    let approximator = FeatureApproximator::new(
        kernel,
        adapter.input_dimension(),
        config.approximation_dimension,
        config.seed,
    )?;
    let blocks = partition_by_contig(points, contig_order)?;
    let total_blocks = blocks.len();
    let completed = AtomicUsize::new(0);

    let run_block = |block: &ChromosomeBlock<'_, A::Value>| {
        let outcome = segment_block(block, adapter, &approximator, config, ctx, started_at)?;
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        ctx.report_progress(done as f32 / total_blocks as f32);
        Ok::<_, KsegError>(outcome)
    };

    #[cfg(feature = "rayon")]
    let (outcomes, thread_count) = if can_use_parallel(ctx, total_blocks) {
        // Collected in block order so a failing run reports its first failing block.
        let outcomes = blocks
            .par_iter()
            .map(run_block)
            .collect::<Vec<Result<BlockOutcome, KsegError>>>()
            .into_iter()
            .collect::<Result<Vec<_>, KsegError>>()?;
        (outcomes, Some(rayon::current_num_threads()))
    } else {
        let outcomes = blocks.iter().map(run_block).collect::<Result<Vec<_>, _>>()?;
        (outcomes, None)
    };
    #[cfg(not(feature = "rayon"))]
    let (outcomes, thread_count): (Vec<BlockOutcome>, Option<usize>) = (
        blocks.iter().map(run_block).collect::<Result<Vec<_>, _>>()?,
        None,
    );

    let mut segments = vec![];
    let mut chromosome_reports = Vec::with_capacity(outcomes.len());
    let mut pruning = PruningStats::default();
    for outcome in outcomes {
        segments.extend(outcome.segments);
        chromosome_reports.push(outcome.report);
        pruning.candidates_considered += outcome.considered;
        pruning.candidates_pruned += outcome.pruned;
    }

    let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut notes = vec![
        format!("kernel={}", kernel.label()),
        format!("feature_dimension={}", approximator.output_dimension()),
        format!("window_sizes={:?}", config.window_sizes),
        format!(
            "penalty=alpha*c+beta*c*ln(n/c), alpha={}, beta={}",
            config.linear_penalty_factor, config.log_linear_penalty_factor
        ),
        format!("exhaustive_search_limit={}", config.exhaustive_search_limit),
    ];
    if ctx.repro_mode == ReproMode::Strict {
        notes.push("repro_mode=strict: sequential execution, compensated sums".to_string());
    }

    let diagnostics = Diagnostics {
        n: points.len(),
        d: approximator.output_dimension(),
        chromosomes: total_blocks,
        runtime_ms: Some(runtime_ms),
        notes,
        warnings: approximator.warnings().to_vec(),
        algorithm: Cow::Borrowed("kernel_segmentation"),
        kernel: Cow::Borrowed(kernel.label()),
        domain: Cow::Borrowed(adapter.name()),
        seed: Some(config.seed),
        repro_mode: ctx.repro_mode,
        thread_count,
        #[cfg(feature = "serde")]
        params_json: serde_json::to_value(config).ok(),
        pruning_stats: Some(pruning),
        chromosome_reports,
        ..Diagnostics::default()
    };

    ctx.record_scalar("offline.kseg.chromosomes", total_blocks as f64);
    ctx.record_scalar("offline.kseg.segments", segments.len() as f64);
    ctx.record_scalar("offline.kseg.runtime_ms", runtime_ms as f64);
    log::info!(
        "segmented {} {} points on {} chromosomes into {} segments",
        points.len(),
        adapter.name(),
        total_blocks,
        segments.len()
    );

    Ok(SegmentationResult {
        segments,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::{KernelSegmenter, segment_ordered_signal};
    use crate::adapters::CopyRatioAdapter;
    use crate::config::SegmentationConfig;
    use crate::merge::GapPolicy;
    use kseg_core::{
        AllelicCount, CancelToken, CandidateSearch, ContigOrder, CopyRatio, DataPoint,
        ExecutionContext, GenomicInterval, KsegError, ProgressSink, ReproMode,
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProgress {
        values: Mutex<Vec<f32>>,
    }

    impl ProgressSink for RecordingProgress {
        fn on_progress(&self, fraction: f32) {
            self.values
                .lock()
                .expect("progress mutex should lock")
                .push(fraction);
        }
    }

    fn copy_ratio_points(contig: &str, levels: &[(f64, usize)]) -> Vec<DataPoint<CopyRatio>> {
        let mut points = vec![];
        let mut start = 1u64;
        for &(level, len) in levels {
            for _ in 0..len {
                points.push(DataPoint::new(
                    GenomicInterval::new(contig, start, start + 9).expect("valid interval"),
                    CopyRatio::new(level),
                ));
                start += 10;
            }
        }
        points
    }

    fn small_config() -> SegmentationConfig {
        SegmentationConfig {
            max_changepoints_per_chromosome: 5,
            approximation_dimension: 1,
            window_sizes: vec![4, 8],
            linear_penalty_factor: 1.0,
            log_linear_penalty_factor: 1.0,
            ..SegmentationConfig::default()
        }
    }

    fn interval(contig: &str, start: u64, end: u64) -> GenomicInterval {
        GenomicInterval::new(contig, start, end).expect("valid interval")
    }

    #[test]
    fn segments_step_signal_per_contig() {
        let mut points = copy_ratio_points("1", &[(0.0, 20), (2.0, 20)]);
        points.extend(copy_ratio_points("2", &[(1.0, 30)]));

        let segmenter = KernelSegmenter::copy_ratio(small_config()).expect("config is valid");
        let result = segmenter
            .segment(&points, None, &ExecutionContext::new())
            .expect("segmentation should succeed");

        assert_eq!(
            result.segments,
            vec![
                interval("1", 1, 200),
                interval("1", 201, 400),
                interval("2", 1, 300),
            ]
        );
        let diagnostics = &result.diagnostics;
        assert_eq!(diagnostics.n, 70);
        assert_eq!(diagnostics.d, 1);
        assert_eq!(diagnostics.chromosomes, 2);
        assert_eq!(diagnostics.kernel, "linear");
        assert_eq!(diagnostics.domain, "copy_ratio");
        assert_eq!(diagnostics.total_change_count(), 1);
        assert_eq!(
            diagnostics.chromosome_reports[0].candidate_search,
            CandidateSearch::Exhaustive
        );
        assert!(diagnostics.warnings.is_empty());
    }

    #[test]
    fn windowed_search_matches_exhaustive_on_clear_steps() {
        let points = copy_ratio_points("1", &[(0.0, 40), (3.0, 30), (-1.0, 50)]);
        let exhaustive = KernelSegmenter::copy_ratio(small_config())
            .expect("config is valid")
            .segment(&points, None, &ExecutionContext::new())
            .expect("segmentation should succeed");
        let windowed = KernelSegmenter::copy_ratio(SegmentationConfig {
            exhaustive_search_limit: 0,
            ..small_config()
        })
        .expect("config is valid")
        .segment(&points, None, &ExecutionContext::new())
        .expect("segmentation should succeed");

        assert_eq!(windowed.segments, exhaustive.segments);
        assert_eq!(exhaustive.segments.len(), 3);
        assert_eq!(
            windowed.diagnostics.chromosome_reports[0].candidate_search,
            CandidateSearch::Windowed
        );
        let stats = windowed
            .diagnostics
            .pruning_stats
            .as_ref()
            .expect("pruning stats are recorded");
        assert_eq!(stats.candidates_considered, 119);
        assert!(stats.candidates_pruned > 100);
    }

    #[test]
    fn single_point_contig_yields_one_segment() {
        let mut points = copy_ratio_points("1", &[(0.0, 10)]);
        points.push(DataPoint::new(interval("2", 500, 600), CopyRatio::new(4.0)));
        let result = KernelSegmenter::copy_ratio(small_config())
            .expect("config is valid")
            .segment(&points, None, &ExecutionContext::new())
            .expect("segmentation should succeed");
        assert_eq!(
            result.segments,
            vec![interval("1", 1, 100), interval("2", 500, 600)]
        );
    }

    #[test]
    fn empty_input_yields_no_segments() {
        let points: Vec<DataPoint<CopyRatio>> = vec![];
        let result = KernelSegmenter::copy_ratio(small_config())
            .expect("config is valid")
            .segment(&points, None, &ExecutionContext::new())
            .expect("empty input is valid");
        assert!(result.segments.is_empty());
        assert_eq!(result.diagnostics.chromosomes, 0);
    }

    #[test]
    fn zero_max_changepoints_returns_whole_contigs() {
        let points = copy_ratio_points("1", &[(0.0, 20), (5.0, 20)]);
        let result = KernelSegmenter::copy_ratio(SegmentationConfig {
            max_changepoints_per_chromosome: 0,
            ..small_config()
        })
        .expect("config is valid")
        .segment(&points, None, &ExecutionContext::new())
        .expect("segmentation should succeed");
        assert_eq!(result.segments, vec![interval("1", 1, 400)]);
    }

    fn gapped_step_points() -> Vec<DataPoint<CopyRatio>> {
        (0..40u64)
            .map(|i| {
                DataPoint::new(
                    interval("3", i * 100 + 1, i * 100 + 10),
                    CopyRatio::new(if i < 20 { 0.0 } else { 2.0 }),
                )
            })
            .collect()
    }

    #[test]
    fn default_config_covers_gapped_bins_end_to_end() {
        let points = gapped_step_points();
        let result = KernelSegmenter::copy_ratio(SegmentationConfig::default())
            .expect("default config is valid")
            .segment(&points, None, &ExecutionContext::new())
            .expect("segmentation should succeed");
        assert_eq!(
            result.segments,
            vec![interval("3", 1, 2_000), interval("3", 2_001, 3_910)]
        );
        let covered: u64 = result.segments.iter().map(GenomicInterval::length).sum();
        assert_eq!(covered, 3_910);
    }

    #[test]
    fn preserve_gap_policy_keeps_unobserved_bases_out() {
        let result = KernelSegmenter::copy_ratio(SegmentationConfig {
            gap_policy: GapPolicy::Preserve,
            ..small_config()
        })
        .expect("config is valid")
        .segment(&gapped_step_points(), None, &ExecutionContext::new())
        .expect("segmentation should succeed");
        assert_eq!(
            result.segments,
            vec![interval("3", 1, 1_910), interval("3", 2_001, 3_910)]
        );
    }

    #[test]
    fn parallel_runs_report_the_first_failing_chromosome() {
        let mut points = vec![];
        for contig in ["1", "2", "3", "4"] {
            points.extend(copy_ratio_points(contig, &[(0.0, 30), (1.0, 30)]));
        }
        points[60 + 7].value = CopyRatio::new(f64::NAN);
        points[180 + 3].value = CopyRatio::new(f64::INFINITY);

        let segmenter = KernelSegmenter::copy_ratio(small_config()).expect("config is valid");
        let ctx = ExecutionContext::new().with_repro_mode(ReproMode::Balanced);
        for _ in 0..20 {
            let err = segmenter
                .segment(&points, None, &ctx)
                .expect_err("non-finite copy ratios must fail");
            assert!(
                err.to_string().starts_with("invalid input: point 67 at 2:71-80"),
                "unexpected error: {err}"
            );
        }
    }

    #[test]
    fn config_errors_precede_data_errors() {
        let points = vec![
            DataPoint::new(interval("1", 20, 30), CopyRatio::new(0.0)),
            DataPoint::new(interval("1", 1, 10), CopyRatio::new(0.0)),
        ];
        let config = SegmentationConfig {
            window_sizes: vec![],
            ..small_config()
        };
        let err = segment_ordered_signal(
            &points,
            &CopyRatioAdapter,
            &config,
            None,
            &ExecutionContext::new(),
        )
        .expect_err("invalid config must fail");
        assert!(matches!(err, KsegError::InvalidConfig(_)));

        let err = segment_ordered_signal(
            &points,
            &CopyRatioAdapter,
            &small_config(),
            None,
            &ExecutionContext::new(),
        )
        .expect_err("unsorted input must fail");
        assert!(err.to_string().contains("point 1 at 1:1-10"));
    }

    #[test]
    fn invalid_values_name_their_position() {
        let mut points = copy_ratio_points("1", &[(0.0, 5)]);
        points[3].value = CopyRatio::new(f64::NAN);
        let err = KernelSegmenter::copy_ratio(small_config())
            .expect("config is valid")
            .segment(&points, None, &ExecutionContext::new())
            .expect_err("NaN must fail");
        assert!(err.to_string().contains("point 3 at 1:31-40"));

        let counts = vec![
            DataPoint::new(interval("1", 1, 1), AllelicCount::new(10, 12)),
            DataPoint::new(interval("1", 2, 2), AllelicCount::new(0, 0)),
        ];
        let err = KernelSegmenter::allele_fraction(small_config())
            .expect("config is valid")
            .segment(&counts, None, &ExecutionContext::new())
            .expect_err("zero depth must fail");
        assert!(err.to_string().contains("point 1 at 1:2-2"));
    }

    #[test]
    fn contig_order_violations_are_reported() {
        let mut points = copy_ratio_points("2", &[(0.0, 5)]);
        points.extend(copy_ratio_points("1", &[(0.0, 5)]));
        let order = ContigOrder::new(["1", "2"]).expect("order should build");
        let err = KernelSegmenter::copy_ratio(small_config())
            .expect("config is valid")
            .segment(&points, Some(&order), &ExecutionContext::new())
            .expect_err("out of order must fail");
        assert!(err.to_string().contains("out of contig order"));
    }

    #[test]
    fn cancelled_context_aborts_run() {
        let points = copy_ratio_points("1", &[(0.0, 20), (2.0, 20)]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let ctx = ExecutionContext::new().with_cancel(&cancel);
        let err = KernelSegmenter::copy_ratio(small_config())
            .expect("config is valid")
            .segment(&points, None, &ctx)
            .expect_err("cancelled run must fail");
        assert_eq!(err, KsegError::Cancelled);
    }

    #[test]
    fn strict_and_balanced_agree_and_report_progress() {
        let mut points = copy_ratio_points("1", &[(0.0, 25), (1.5, 25)]);
        points.extend(copy_ratio_points("2", &[(0.5, 30), (-1.0, 20)]));
        points.extend(copy_ratio_points("3", &[(0.2, 50)]));

        let progress = RecordingProgress::default();
        let strict_ctx = ExecutionContext::new()
            .with_repro_mode(ReproMode::Strict)
            .with_progress_sink(&progress);
        let segmenter = KernelSegmenter::copy_ratio(small_config()).expect("config is valid");
        let strict = segmenter
            .segment(&points, None, &strict_ctx)
            .expect("strict run should succeed");
        let balanced = segmenter
            .segment(&points, None, &ExecutionContext::new())
            .expect("balanced run should succeed");

        assert_eq!(strict.segments, balanced.segments);
        assert_eq!(strict.diagnostics.thread_count, None);
        let values = progress.values.lock().expect("progress mutex should lock");
        assert_eq!(values.as_slice(), &[1.0 / 3.0, 2.0 / 3.0, 1.0]);
    }

    #[test]
    fn linear_kernel_warns_when_dimension_is_ignored() {
        let points = copy_ratio_points("1", &[(0.0, 10)]);
        let result = KernelSegmenter::copy_ratio(SegmentationConfig {
            approximation_dimension: 20,
            ..small_config()
        })
        .expect("config is valid")
        .segment(&points, None, &ExecutionContext::new())
        .expect("segmentation should succeed");
        assert_eq!(result.diagnostics.warnings.len(), 1);
        assert_eq!(result.diagnostics.d, 1);
    }
}
