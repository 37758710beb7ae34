// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::interval::GenomicInterval;

/// One observation: a genomic interval and its immutable payload.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DataPoint<V> {
    pub interval: GenomicInterval,
    pub value: V,
}

impl<V> DataPoint<V> {
    pub fn new(interval: GenomicInterval, value: V) -> Self {
        Self { interval, value }
    }

    pub fn contig(&self) -> &str {
        &self.interval.contig
    }
}

/// Denoised log2 copy ratio of one genomic bin.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CopyRatio {
    pub log2_copy_ratio: f64,
}

impl CopyRatio {
    pub fn new(log2_copy_ratio: f64) -> Self {
        Self { log2_copy_ratio }
    }
}

/// Reference and alternate read counts at one heterozygous site.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllelicCount {
    pub ref_count: u32,
    pub alt_count: u32,
}

impl AllelicCount {
    pub fn new(ref_count: u32, alt_count: u32) -> Self {
        Self {
            ref_count,
            alt_count,
        }
    }

    pub fn total(&self) -> u64 {
        u64::from(self.ref_count) + u64::from(self.alt_count)
    }

    /// Alternate-allele fraction, or `None` at zero depth.
    pub fn alt_fraction(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| f64::from(self.alt_count) / total as f64)
    }

    /// Fraction of reads supporting the less-supported allele, in `[0, 0.5]`.
    pub fn minor_allele_fraction(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| f64::from(self.ref_count.min(self.alt_count)) / total as f64)
    }
}
