// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kseg_core::{ChromosomeBlock, GenomicInterval, KsegError};

/// How segment boundaries treat unobserved bases between adjacent points.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GapPolicy {
    /// Segments run from their first point's start to their last point's end.
    Preserve,
    /// Each segment except the last extends to the base before the next one,
    /// so a contig's segments cover its first-to-last point span.
    #[default]
    Close,
}

/// Validates that `changepoints` are strictly increasing splits in `1..n`.
pub fn validate_changepoints(changepoints: &[usize], n: usize) -> Result<(), KsegError> {
    let mut previous = 0usize;
    for &split in changepoints {
        if split == 0 || split >= n {
            return Err(KsegError::invalid_input(format!(
                "changepoint {split} out of range for a block of {n} points; expected 1..{n}"
            )));
        }
        if split <= previous {
            return Err(KsegError::invalid_input(format!(
                "changepoints must be strictly increasing; got {split} after {previous}"
            )));
        }
        previous = split;
    }
    Ok(())
}

/// Converts a block and its changepoints into output intervals.
///
/// A changepoint `c` starts a new segment at the block's `c`-th point.
pub fn merge_segments<V>(
    block: &ChromosomeBlock<'_, V>,
    changepoints: &[usize],
    gap_policy: GapPolicy,
) -> Result<Vec<GenomicInterval>, KsegError> {
    let points = block.points();
    if points.is_empty() {
        return Ok(vec![]);
    }
    validate_changepoints(changepoints, points.len())?;

    let mut segments = Vec::with_capacity(changepoints.len() + 1);
    let mut start = 0usize;
    for end in changepoints.iter().copied().chain(std::iter::once(points.len())) {
        let next_start = points.get(end).map(|point| point.interval.start);
        let segment_end = match (gap_policy, next_start) {
            (GapPolicy::Close, Some(next_start)) => next_start - 1,
            _ => points[end - 1].interval.end,
        };
        segments.push(GenomicInterval {
            contig: block.contig().to_string(),
            start: points[start].interval.start,
            end: segment_end,
        });
        start = end;
    }
    Ok(segments)
}
