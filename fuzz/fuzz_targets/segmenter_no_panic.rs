// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use kseg_core::{AllelicCount, CopyRatio, DataPoint, ExecutionContext, GenomicInterval, ReproMode};
use kseg_offline::{GapPolicy, KernelSegmenter, SegmentationConfig};
use libfuzzer_sys::fuzz_target;

fn build_config(cursor: &mut common::ByteCursor<'_>) -> SegmentationConfig {
    let window_count = common::bounded(cursor.next_u8(), 0, 4);
    let window_sizes = (0..window_count)
        .map(|_| common::bounded(cursor.next_u8(), 0, 40))
        .collect();
    SegmentationConfig {
        max_changepoints_per_chromosome: common::bounded(cursor.next_u8(), 0, 12),
        kernel_bandwidth: match cursor.next_u8() % 5 {
            0 => 0.0,
            1 => -1.0,
            2 => f64::NAN,
            _ => f64::from(cursor.next_u8()) / 64.0,
        },
        approximation_dimension: common::bounded(cursor.next_u8(), 0, 24),
        window_sizes,
        linear_penalty_factor: f64::from(cursor.next_i16()) / 256.0,
        log_linear_penalty_factor: f64::from(cursor.next_u8()) / 32.0,
        seed: u64::from(cursor.next_u16()),
        exhaustive_search_limit: common::bounded(cursor.next_u8(), 0, 64),
        candidate_neighborhood: common::bounded(cursor.next_u8(), 0, 3),
        max_candidates: match cursor.next_u8() % 3 {
            0 => None,
            _ => Some(common::bounded(cursor.next_u8(), 0, 32)),
        },
        gap_policy: if cursor.next_u8() & 1 == 0 {
            GapPolicy::Preserve
        } else {
            GapPolicy::Close
        },
        cancel_check_every: common::bounded(cursor.next_u8(), 0, 64),
    }
}

/// Lays points out mostly in order; some steps move backward, overlap, or
/// switch contig so validation paths are reached too.
fn build_intervals(cursor: &mut common::ByteCursor<'_>, count: usize) -> Vec<GenomicInterval> {
    let mut intervals = Vec::with_capacity(count);
    let mut contig = 1u8;
    let mut position = 1u64;
    for _ in 0..count {
        let op = cursor.next_u8();
        match op % 16 {
            0 => {
                contig = contig.saturating_add(1);
                position = 1;
            }
            1 => contig = 1 + cursor.next_u8() % 4,
            2 => position = position.saturating_sub(u64::from(cursor.next_u8())),
            _ => {}
        }
        let width = u64::from(cursor.next_u8() % 8);
        let start = position.max(1);
        let end = if op % 23 == 0 { start.saturating_sub(1) } else { start + width };
        intervals.push(GenomicInterval {
            contig: contig.to_string(),
            start,
            end,
        });
        position = end.saturating_add(1 + u64::from(cursor.next_u8() % 4));
    }
    intervals
}

fn build_copy_ratio(raw: f64, mode_seed: u8) -> f64 {
    match mode_seed % 11 {
        0 => f64::NAN,
        1 => f64::INFINITY,
        _ => raw.clamp(-1_000.0, 1_000.0),
    }
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);
    let config = build_config(&mut cursor);
    let repro_mode = if cursor.next_u8() & 1 == 0 {
        ReproMode::Balanced
    } else {
        ReproMode::Strict
    };
    let ctx = ExecutionContext::new().with_repro_mode(repro_mode);

    let count = common::bounded(cursor.next_u8(), 0, 160);
    let intervals = build_intervals(&mut cursor, count);

    if cursor.next_u8() & 1 == 0 {
        let payload = cursor.take_padded(count.saturating_mul(8));
        let values = common::decode_f64_chunks(&payload, count);
        let points: Vec<DataPoint<CopyRatio>> = intervals
            .into_iter()
            .zip(values)
            .map(|(interval, raw)| {
                DataPoint::new(interval, CopyRatio::new(build_copy_ratio(raw, cursor.next_u8())))
            })
            .collect();
        if let Ok(segmenter) = KernelSegmenter::copy_ratio(config) {
            let _ = segmenter.segment(&points, None, &ctx);
        }
    } else {
        let points: Vec<DataPoint<AllelicCount>> = intervals
            .into_iter()
            .map(|interval| {
                let ref_count = u32::from(cursor.next_u8());
                let alt_count = u32::from(cursor.next_u8());
                DataPoint::new(interval, AllelicCount::new(ref_count, alt_count))
            })
            .collect();
        if let Ok(segmenter) = KernelSegmenter::allele_fraction(config) {
            let _ = segmenter.segment(&points, None, &ctx);
        }
    }
});
