// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kseg_core::{ExecutionContext, KsegError};
use kseg_costs::SegmentCost;
use std::time::Instant;

/// Largest number of tabulated segment costs; larger searches evaluate on demand.
const MAX_COST_TABLE_ENTRIES: usize = 1 << 26;

/// Parameters of the penalized search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DynpParams {
    pub max_changepoints: usize,
    pub linear_penalty_factor: f64,
    pub log_linear_penalty_factor: f64,
    pub cancel_check_every: usize,
}

/// Result of the penalized search over one chromosome.
#[derive(Clone, Debug, PartialEq)]
pub struct DynpSelection {
    /// Increasing split indices; split `c` starts a new segment at point `c`.
    pub changepoints: Vec<usize>,
    /// Total segment cost of the chosen segmentation.
    pub objective: f64,
    pub penalized_objective: f64,
    /// Best total cost for each changepoint count `0..`.
    pub objective_by_change_count: Vec<f64>,
}

impl DynpSelection {
    pub fn change_count(&self) -> usize {
        self.changepoints.len()
    }
}

struct DynpSweepResult {
    endpoints: Vec<usize>,
    backpointers: Vec<Vec<usize>>,
    objective_by_segment_count: Vec<f64>,
}

/// Segment costs between endpoint pairs, tabulated once when small enough.
struct CostTable<'a, C: SegmentCost + ?Sized> {
    cost: &'a C,
    endpoints: &'a [usize],
    table: Option<Vec<f64>>,
}

impl<'a, C: SegmentCost + ?Sized> CostTable<'a, C> {
    fn build(
        cost: &'a C,
        endpoints: &'a [usize],
        cancel_check_every: usize,
        ctx: &ExecutionContext<'_>,
        started_at: Instant,
    ) -> Result<Self, KsegError> {
        let p = endpoints.len();
        let entries = p.checked_mul(p.saturating_sub(1)).map(|cells| cells / 2);
        let table = match entries {
            Some(entries) if entries <= MAX_COST_TABLE_ENTRIES => {
                let mut table = Vec::with_capacity(entries);
                let mut iteration = 0usize;
                for end_idx in 1..p {
                    for start_idx in 0..end_idx {
                        iteration += 1;
                        ctx.poll_every(iteration, cancel_check_every, started_at)?;
                        table.push(checked_cost(
                            cost,
                            endpoints[start_idx],
                            endpoints[end_idx],
                        )?);
                    }
                }
                Some(table)
            }
            _ => {
                log::debug!("dynp: {p} endpoints exceed the cost table limit; evaluating on demand");
                None
            }
        };
        Ok(Self {
            cost,
            endpoints,
            table,
        })
    }

    fn get(&self, start_idx: usize, end_idx: usize) -> Result<f64, KsegError> {
        match &self.table {
            Some(table) => Ok(table[end_idx * (end_idx - 1) / 2 + start_idx]),
            None => checked_cost(
                self.cost,
                self.endpoints[start_idx],
                self.endpoints[end_idx],
            ),
        }
    }
}

fn checked_cost<C: SegmentCost + ?Sized>(
    cost: &C,
    start: usize,
    end: usize,
) -> Result<f64, KsegError> {
    let value = cost.segment_cost(start, end);
    if !value.is_finite() {
        return Err(KsegError::numerical_issue(format!(
            "non-finite segment cost at [{start}, {end})"
        )));
    }
    Ok(value)
}

/// Penalty for `c` changepoints in a block of `n` points:
/// `alpha * c + beta * c * ln(n / c)`, and zero when `c == 0`.
pub fn changepoint_penalty(n: usize, c: usize, alpha: f64, beta: f64) -> f64 {
    if c == 0 || n == 0 {
        return 0.0;
    }
    let c = c as f64;
    alpha * c + beta * c * (n as f64 / c).ln()
}

fn validate_candidates(candidates: &[usize], n: usize) -> Result<(), KsegError> {
    let mut previous = 0usize;
    for &candidate in candidates {
        if candidate == 0 || candidate >= n {
            return Err(KsegError::invalid_input(format!(
                "candidate split {candidate} out of range for n={n}; expected 1..{n}"
            )));
        }
        if candidate <= previous {
            return Err(KsegError::invalid_input(format!(
                "candidate splits must be strictly increasing; got {candidate} after {previous}"
            )));
        }
        previous = candidate;
    }
    Ok(())
}

fn run_dynp_sweep<C: SegmentCost + ?Sized>(
    table: &CostTable<'_, C>,
    segments: usize,
    cancel_check_every: usize,
    ctx: &ExecutionContext<'_>,
    started_at: Instant,
) -> Result<DynpSweepResult, KsegError> {
    let endpoints = table.endpoints.to_vec();
    let target_idx = endpoints.len() - 1;
    let inf = f64::INFINITY;
    let mut backpointers = vec![vec![usize::MAX; endpoints.len()]; segments + 1];
    let mut objective_by_segment_count = vec![inf; segments + 1];
    let mut dp_prev = vec![inf; endpoints.len()];
    dp_prev[0] = 0.0;
    let mut iteration = 0usize;

    for (segment_count, backpointer_row) in backpointers.iter_mut().enumerate().skip(1) {
        let mut dp_curr = vec![inf; endpoints.len()];

        for end_idx in segment_count..endpoints.len() {
            let mut best_objective = inf;
            let mut best_prev_idx = usize::MAX;

            for start_idx in (segment_count - 1)..end_idx {
                iteration += 1;
                ctx.poll_every(iteration, cancel_check_every, started_at)?;

                if !dp_prev[start_idx].is_finite() {
                    continue;
                }
                let objective = dp_prev[start_idx] + table.get(start_idx, end_idx)?;
                if !objective.is_finite() {
                    return Err(KsegError::numerical_issue(format!(
                        "non-finite dynp objective at segment_count={segment_count}, start={}, end={}",
                        endpoints[start_idx], endpoints[end_idx]
                    )));
                }

                // Strict comparison keeps the earliest start on ties.
                if objective < best_objective {
                    best_objective = objective;
                    best_prev_idx = start_idx;
                }
            }

            if best_prev_idx != usize::MAX {
                dp_curr[end_idx] = best_objective;
                backpointer_row[end_idx] = best_prev_idx;
            }
        }

        objective_by_segment_count[segment_count] = dp_curr[target_idx];
        dp_prev = dp_curr;
    }

    Ok(DynpSweepResult {
        endpoints,
        backpointers,
        objective_by_segment_count,
    })
}

fn reconstruct_changepoints(
    sweep: &DynpSweepResult,
    segment_count: usize,
    n: usize,
) -> Result<Vec<usize>, KsegError> {
    if segment_count == 0 || segment_count >= sweep.backpointers.len() {
        return Err(KsegError::invalid_input(format!(
            "invalid segment_count={segment_count} for backtracking"
        )));
    }

    let mut cursor = sweep.endpoints.len() - 1;
    let mut reversed = Vec::with_capacity(segment_count - 1);
    for current_segment_count in (2..=segment_count).rev() {
        let prev_idx = sweep.backpointers[current_segment_count][cursor];
        if prev_idx == usize::MAX {
            return Err(KsegError::invalid_input(format!(
                "backtracking failed at segment_count={current_segment_count}, endpoint={}",
                sweep.endpoints[cursor]
            )));
        }
        let split = sweep.endpoints[prev_idx];
        if split == 0 || split >= n {
            return Err(KsegError::invalid_input(format!(
                "invalid split during backtracking at split={split}"
            )));
        }
        reversed.push(split);
        cursor = prev_idx;
    }
    reversed.reverse();
    Ok(reversed)
}

/// Chooses the number and positions of changepoints in one block.
///
/// Segment boundaries are restricted to `candidates` (strictly increasing,
/// each in `1..n`). For each segment count `k` up to
/// `min(max_changepoints, candidates.len()) + 1` the minimal total segment
/// cost is found exactly by dynamic programming; the count minimizing cost
/// plus [`changepoint_penalty`] wins, preferring fewer changepoints on ties.
pub fn segment_penalized<C: SegmentCost + ?Sized>(
    cost: &C,
    candidates: &[usize],
    params: &DynpParams,
    ctx: &ExecutionContext<'_>,
    started_at: Instant,
) -> Result<DynpSelection, KsegError> {
    let n = cost.len();
    let whole = if n == 0 { 0.0 } else { checked_cost(cost, 0, n)? };
    if n <= 1 || params.max_changepoints == 0 {
        return Ok(DynpSelection {
            changepoints: vec![],
            objective: whole,
            penalized_objective: whole,
            objective_by_change_count: vec![whole],
        });
    }
    validate_candidates(candidates, n)?;
    for (name, value) in [
        ("linear_penalty_factor", params.linear_penalty_factor),
        ("log_linear_penalty_factor", params.log_linear_penalty_factor),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(KsegError::invalid_config(format!(
                "{name} must be finite and >= 0; got {value}"
            )));
        }
    }

    let cancel_check_every = params.cancel_check_every.max(1);
    let mut endpoints = Vec::with_capacity(candidates.len() + 2);
    endpoints.push(0);
    endpoints.extend_from_slice(candidates);
    endpoints.push(n);

    let segments = params.max_changepoints.min(candidates.len()) + 1;
    let table = CostTable::build(cost, &endpoints, cancel_check_every, ctx, started_at)?;
    let sweep = run_dynp_sweep(&table, segments, cancel_check_every, ctx, started_at)?;

    let mut best_segment_count = 0usize;
    let mut best_objective = f64::INFINITY;
    let mut best_penalized_objective = f64::INFINITY;
    for segment_count in 1..sweep.objective_by_segment_count.len() {
        let objective = sweep.objective_by_segment_count[segment_count];
        if !objective.is_finite() {
            continue;
        }
        let penalized_objective = objective
            + changepoint_penalty(
                n,
                segment_count - 1,
                params.linear_penalty_factor,
                params.log_linear_penalty_factor,
            );
        if !penalized_objective.is_finite() {
            return Err(KsegError::numerical_issue(format!(
                "non-finite penalized objective for {} changepoints",
                segment_count - 1
            )));
        }
        if penalized_objective < best_penalized_objective {
            best_segment_count = segment_count;
            best_objective = objective;
            best_penalized_objective = penalized_objective;
        }
    }

    if best_segment_count == 0 {
        return Err(KsegError::numerical_issue(
            "dynp found no finite segmentation",
        ));
    }

    let changepoints = reconstruct_changepoints(&sweep, best_segment_count, n)?;
    Ok(DynpSelection {
        changepoints,
        objective: best_objective,
        penalized_objective: best_penalized_objective,
        objective_by_change_count: sweep.objective_by_segment_count[1..].to_vec(),
    })
}
