// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kseg_bench::{allelic_count_points, contig_order, copy_ratio_points};
use kseg_core::{ExecutionContext, ReproMode};
use kseg_offline::{KernelSegmenter, SegmentationConfig};

fn bench_copy_ratio(c: &mut Criterion, case_id: &str, contigs: usize, per_contig: usize) {
    let points = copy_ratio_points(contigs, per_contig, per_contig / 8, 11);
    let order = contig_order(contigs);
    let segmenter = KernelSegmenter::copy_ratio(SegmentationConfig {
        kernel_bandwidth: 0.5,
        approximation_dimension: 20,
        ..SegmentationConfig::default()
    })
    .expect("segmenter config should be valid");

    for mode in [ReproMode::Balanced, ReproMode::Strict] {
        let ctx = ExecutionContext::new().with_repro_mode(mode);
        c.bench_function(&format!("{case_id}_{mode:?}"), |b| {
            b.iter(|| {
                segmenter
                    .segment(black_box(&points), order.as_ref(), black_box(&ctx))
                    .expect("copy-ratio benchmark segment should succeed")
            })
        });
    }
}

fn benchmark_copy_ratio(c: &mut Criterion) {
    bench_copy_ratio(c, "copy_ratio_exhaustive_4x800", 4, 800);
    bench_copy_ratio(c, "copy_ratio_windowed_4x10000", 4, 10_000);
}

fn benchmark_allele_fraction(c: &mut Criterion) {
    let points = allelic_count_points(2, 5_000, 1_000, 3);
    let order = contig_order(2);
    let segmenter = KernelSegmenter::allele_fraction(SegmentationConfig {
        kernel_bandwidth: 0.025,
        approximation_dimension: 20,
        ..SegmentationConfig::default()
    })
    .expect("segmenter config should be valid");
    let ctx = ExecutionContext::new();

    c.bench_function("allele_fraction_windowed_2x5000", |b| {
        b.iter(|| {
            segmenter
                .segment(black_box(&points), order.as_ref(), black_box(&ctx))
                .expect("allele-fraction benchmark segment should succeed")
        })
    });
}

criterion_group!(benches, benchmark_copy_ratio, benchmark_allele_fraction);
criterion_main!(benches);
