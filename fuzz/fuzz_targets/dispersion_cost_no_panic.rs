// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use kseg_core::ReproMode;
use kseg_costs::{DispersionCache, FeatureApproximator, KernelFunction, SegmentCost};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);
    let bandwidth = f64::from(cursor.next_u8()) / 32.0;
    let Ok(kernel) = KernelFunction::from_bandwidth(bandwidth) else {
        return;
    };
    let dimension = common::bounded(cursor.next_u8(), 1, 32);
    let Ok(approx) = FeatureApproximator::new(kernel, 1, dimension, u64::from(cursor.next_u16()))
    else {
        return;
    };

    let count = common::bounded(cursor.next_u8(), 0, 128);
    let values: Vec<f64> = common::decode_f64_chunks(&cursor.take_padded(count * 8), count)
        .into_iter()
        .map(|value| {
            if value.is_finite() {
                value.clamp(-1.0e6, 1.0e6)
            } else {
                value
            }
        })
        .collect();
    let Ok(features) = approx.featurize(&values) else {
        return;
    };
    let mode = if cursor.next_u8() & 1 == 0 {
        ReproMode::Balanced
    } else {
        ReproMode::Strict
    };
    let Ok(cache) = DispersionCache::new(&features, mode) else {
        return;
    };

    let n = cache.len();
    for _ in 0..common::bounded(cursor.next_u8(), 1, 32) {
        let a = common::bounded(cursor.next_u8(), 0, n);
        let b = common::bounded(cursor.next_u8(), 0, n);
        let (start, end) = (a.min(b), a.max(b));
        let cost = cache.segment_cost(start, end);
        assert!(cost >= 0.0, "segment cost must be non-negative, got {cost}");
        if end > start + 1 {
            let split = start + 1 + usize::from(cursor.next_u8()) % (end - start - 1);
            assert!(cache.mean_shift(start, split, end).is_finite());
        }
    }
});
