// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::data::DataPoint;
use crate::dictionary::ContigOrder;
use crate::error::KsegError;
use std::collections::HashSet;

/// A maximal run of consecutive points on one contig.
///
/// Blocks borrow the caller's points; nothing is copied or re-sorted.
#[derive(Debug)]
pub struct ChromosomeBlock<'a, V> {
    contig: &'a str,
    offset: usize,
    points: &'a [DataPoint<V>],
}

impl<V> Clone for ChromosomeBlock<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for ChromosomeBlock<'_, V> {}

impl<'a, V> ChromosomeBlock<'a, V> {
    pub fn contig(&self) -> &'a str {
        self.contig
    }

    /// Index of the block's first point in the original input.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn points(&self) -> &'a [DataPoint<V>] {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Groups consecutive points by contig, preserving input order.
///
/// Within a contig each point must start after the previous point ends. A
/// contig may not reappear once another contig has started. When a contig
/// order is given, every contig must be listed in it, blocks must follow its
/// order, and points must fit inside known contig lengths.
pub fn partition_by_contig<'a, V>(
    points: &'a [DataPoint<V>],
    contig_order: Option<&ContigOrder>,
) -> Result<Vec<ChromosomeBlock<'a, V>>, KsegError> {
    let mut blocks: Vec<ChromosomeBlock<'a, V>> = vec![];
    let mut seen: HashSet<&'a str> = HashSet::new();
    let mut previous_order_index: Option<usize> = None;
    let mut block_start = 0usize;

    for (idx, point) in points.iter().enumerate() {
        let interval = &point.interval;
        interval.validate().map_err(|err| match err {
            KsegError::InvalidInput(message) => {
                KsegError::invalid_input(format!("point {idx}: {message}"))
            }
            other => other,
        })?;

        if let Some(order) = contig_order
            && let Some(length) = order.length_of(&interval.contig)
            && interval.end > length
        {
            return Err(KsegError::invalid_input(format!(
                "point {idx} at {interval} extends past contig length {length}"
            )));
        }

        let continues_block = idx > 0 && points[idx - 1].interval.contig == interval.contig;
        if continues_block {
            let previous = &points[idx - 1].interval;
            if interval.start <= previous.end {
                return Err(KsegError::invalid_input(format!(
                    "point {idx} at {interval} does not start after previous point {previous}; \
                     points must be sorted by position and non-overlapping within a contig"
                )));
            }
            continue;
        }

        if idx > 0 {
            blocks.push(ChromosomeBlock {
                contig: &points[block_start].interval.contig,
                offset: block_start,
                points: &points[block_start..idx],
            });
        }

        if !seen.insert(interval.contig.as_str()) {
            return Err(KsegError::invalid_input(format!(
                "point {idx} at {interval}: contig {} reappears after other contigs; \
                 points must be grouped by contig",
                interval.contig
            )));
        }

        if let Some(order) = contig_order {
            let Some(order_index) = order.index_of(&interval.contig) else {
                return Err(KsegError::invalid_input(format!(
                    "point {idx} at {interval}: contig {} is not in the contig order",
                    interval.contig
                )));
            };
            if previous_order_index.is_some_and(|previous| order_index < previous) {
                return Err(KsegError::invalid_input(format!(
                    "point {idx} at {interval}: contig {} is out of contig order",
                    interval.contig
                )));
            }
            previous_order_index = Some(order_index);
        }

        block_start = idx;
    }

    if !points.is_empty() {
        blocks.push(ChromosomeBlock {
            contig: &points[block_start].interval.contig,
            offset: block_start,
            points: &points[block_start..],
        });
    }

    log::debug!(
        "partitioned {} points into {} chromosome blocks",
        points.len(),
        blocks.len()
    );
    Ok(blocks)
}
