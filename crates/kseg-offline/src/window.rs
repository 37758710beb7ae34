// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kseg_core::{ExecutionContext, KsegError};
use kseg_costs::SegmentCost;
use std::collections::BTreeSet;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq)]
struct CandidateScore {
    split: usize,
    score: f64,
}

/// Candidates chosen for one chromosome, with restriction counters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateSelection {
    pub candidates: Vec<usize>,
    /// Split indices `1..n` available before restriction.
    pub considered: usize,
    pub pruned: usize,
}

/// Every split index of a block of `n` points.
pub fn all_splits(n: usize) -> CandidateSelection {
    let candidates: Vec<usize> = (1..n).collect();
    CandidateSelection {
        considered: candidates.len(),
        pruned: 0,
        candidates,
    }
}

/// Returns the `[left, right)` neighbourhood of `split` for window `w`, if it fits.
fn window_bounds(split: usize, window: usize, n: usize) -> Option<(usize, usize)> {
    let left = split.checked_sub(window)?;
    let right = split.checked_add(window)?;
    (right <= n && split > 0).then_some((left, right))
}

/// Mean-shift scores for one window size, indexed by split (length `n + 1`).
///
/// The score at `i` is the squared distance between the mean feature vectors
/// of `[i - w, i)` and `[i, i + w)`; splits where the window does not fit
/// score zero.
pub fn window_scores<C: SegmentCost + ?Sized>(cost: &C, window: usize) -> Vec<f64> {
    let n = cost.len();
    let mut scores = vec![0.0; n + 1];
    if window == 0 {
        return scores;
    }
    for (split, score) in scores.iter_mut().enumerate() {
        if let Some((left, right)) = window_bounds(split, window, n) {
            *score = cost.mean_shift(left, split, right);
        }
    }
    scores
}

/// Maximum of the per-window scores at every split.
pub fn combined_scores<C: SegmentCost + ?Sized>(cost: &C, windows: &[usize]) -> Vec<f64> {
    let mut combined = vec![0.0; cost.len() + 1];
    for &window in windows {
        for (best, score) in combined.iter_mut().zip(window_scores(cost, window)) {
            if score > *best {
                *best = score;
            }
        }
    }
    combined
}

/// Local maxima of `scores` within `+-radius` among splits where the window fits.
///
/// Plateaus resolve to their earliest split. Zero scores are never peaks.
fn extract_peaks(scores: &[f64], window: usize, n: usize) -> Vec<CandidateScore> {
    let mut peaks = vec![];
    if window == 0 || n < 2 * window {
        return peaks;
    }
    let first = window;
    let last = n - window;
    for split in first..=last {
        let score = scores[split];
        if score <= 0.0 {
            continue;
        }
        let lo = split.saturating_sub(window).max(first);
        let hi = (split + window).min(last);
        let left_ok = scores[lo..split].iter().all(|&other| score > other);
        let right_ok = scores[split + 1..=hi].iter().all(|&other| score >= other);
        if left_ok && right_ok {
            peaks.push(CandidateScore { split, score });
        }
    }
    peaks
}

fn rank_candidates(scores: &mut [CandidateScore]) {
    scores.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then_with(|| left.split.cmp(&right.split))
    });
}

/// Restricts changepoint candidates using windowed mean-shift peaks.
///
/// For every window the top `max_changepoints` peaks are kept, together with
/// the splits within `neighborhood` of each. The union is returned in
/// ascending order. When `max_candidates` is set, the lowest-scoring
/// candidates (by combined score) are pruned until the cap holds.
pub fn select_candidates<C: SegmentCost + ?Sized>(
    cost: &C,
    windows: &[usize],
    max_changepoints: usize,
    neighborhood: usize,
    max_candidates: Option<usize>,
    ctx: &ExecutionContext<'_>,
    started_at: Instant,
) -> Result<CandidateSelection, KsegError> {
    let n = cost.len();
    let considered = n.saturating_sub(1);
    if n < 2 || max_changepoints == 0 {
        return Ok(CandidateSelection {
            candidates: vec![],
            considered,
            pruned: considered,
        });
    }

    let mut union = BTreeSet::new();
    let mut combined = vec![0.0; n + 1];
    for &window in windows {
        ctx.check_cancelled()?;
        ctx.check_time_budget(started_at)?;

        let scores = window_scores(cost, window);
        for (best, &score) in combined.iter_mut().zip(scores.iter()) {
            if score > *best {
                *best = score;
            }
        }

        let mut peaks = extract_peaks(&scores, window, n);
        rank_candidates(&mut peaks);
        for peak in peaks.iter().take(max_changepoints) {
            let lo = peak.split.saturating_sub(neighborhood).max(1);
            let hi = peak.split.saturating_add(neighborhood).min(n - 1);
            union.extend(lo..=hi);
        }
    }

    let mut candidates: Vec<usize> = union.into_iter().collect();
    if let Some(cap) = max_candidates
        && candidates.len() > cap
    {
        let mut ranked: Vec<CandidateScore> = candidates
            .iter()
            .map(|&split| CandidateScore {
                split,
                score: combined[split],
            })
            .collect();
        rank_candidates(&mut ranked);
        ranked.truncate(cap);
        candidates = ranked.into_iter().map(|candidate| candidate.split).collect();
        candidates.sort_unstable();
    }

    Ok(CandidateSelection {
        pruned: considered - candidates.len(),
        considered,
        candidates,
    })
}
