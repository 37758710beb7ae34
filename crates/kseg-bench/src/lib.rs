// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Deterministic inputs shared by the kseg benchmarks.

use kseg_core::{AllelicCount, ContigOrder, CopyRatio, DataPoint, GenomicInterval};

const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const LCG_INCREMENT: u64 = 1_442_695_040_888_963_407;

/// Small linear congruential generator; benches need repeatable noise, not quality.
#[derive(Clone, Debug)]
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Centered noise in `[-amplitude, amplitude)`.
    pub fn jitter(&mut self, amplitude: f64) -> f64 {
        (self.next_f64() * 2.0 - 1.0) * amplitude
    }
}

/// Piecewise-constant scalar signal with a level change every `run` points.
pub fn step_values(n: usize, run: usize, noise: f64, seed: u64) -> Vec<f64> {
    let mut rng = Lcg::new(seed);
    (0..n)
        .map(|i| ((i / run.max(1)) % 4) as f64 + rng.jitter(noise))
        .collect()
}

fn bin(contig: &str, index: usize, width: u64) -> GenomicInterval {
    let start = index as u64 * width + 1;
    GenomicInterval {
        contig: contig.to_string(),
        start,
        end: start + width - 1,
    }
}

/// Copy-ratio bins spread over `contigs` equally sized contigs named `1..`.
pub fn copy_ratio_points(
    contigs: usize,
    per_contig: usize,
    run: usize,
    seed: u64,
) -> Vec<DataPoint<CopyRatio>> {
    let mut points = Vec::with_capacity(contigs * per_contig);
    for contig in 0..contigs {
        let name = (contig + 1).to_string();
        let values = step_values(per_contig, run, 0.1, seed.wrapping_add(contig as u64));
        points.extend(
            values
                .into_iter()
                .enumerate()
                .map(|(i, value)| DataPoint::new(bin(&name, i, 1_000), CopyRatio::new(value))),
        );
    }
    points
}

/// Heterozygous sites at depth 100 whose minor fraction alternates between
/// balanced and skewed every `run` sites.
pub fn allelic_count_points(
    contigs: usize,
    per_contig: usize,
    run: usize,
    seed: u64,
) -> Vec<DataPoint<AllelicCount>> {
    let mut rng = Lcg::new(seed);
    let mut points = Vec::with_capacity(contigs * per_contig);
    for contig in 0..contigs {
        let name = (contig + 1).to_string();
        for i in 0..per_contig {
            let minor = if (i / run.max(1)).is_multiple_of(2) { 0.45 } else { 0.2 };
            let fraction = if rng.next_f64() < 0.5 { minor } else { 1.0 - minor };
            let alt = (fraction * 100.0) as u32;
            points.push(DataPoint::new(
                bin(&name, i, 1),
                AllelicCount::new(100 - alt, alt),
            ));
        }
    }
    points
}

/// Contig order matching the names produced by the point generators.
pub fn contig_order(contigs: usize) -> Option<ContigOrder> {
    ContigOrder::new((1..=contigs).map(|contig| contig.to_string())).ok()
}
