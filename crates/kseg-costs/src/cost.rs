// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kseg_core::{KsegError, ReproMode, prefix_sums, prefix_sums_kahan};

/// Row-major `n x d` matrix of feature vectors for one chromosome.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMatrix {
    n: usize,
    d: usize,
    values: Vec<f64>,
}

impl FeatureMatrix {
    pub fn new(n: usize, d: usize, values: Vec<f64>) -> Result<Self, KsegError> {
        if d == 0 {
            return Err(KsegError::invalid_input("feature dimension must be >= 1"));
        }
        let expected = n.checked_mul(d).ok_or_else(|| {
            KsegError::resource_limit(format!("feature matrix size overflow: n={n}, d={d}"))
        })?;
        if values.len() != expected {
            return Err(KsegError::invalid_input(format!(
                "feature matrix expects {expected} values for n={n}, d={d}; got {}",
                values.len()
            )));
        }
        Ok(Self { n, d, values })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn d(&self) -> usize {
        self.d
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.values[index * self.d..(index + 1) * self.d]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Segment cost over half-open index ranges `[start, end)` of one chromosome.
pub trait SegmentCost {
    /// Number of points.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Within-segment dispersion; zero for empty or single-point ranges.
    fn segment_cost(&self, start: usize, end: usize) -> f64;

    /// Squared distance between the mean features of `[left, split)` and
    /// `[split, right)`.
    fn mean_shift(&self, left: usize, split: usize, right: usize) -> f64;
}

/// Prefix-sum cache answering kernel dispersion queries in `O(d)`.
///
/// The cost of `[i, j)` is `sum ||z_t||^2 - ||sum z_t||^2 / (j - i)`, the sum
/// of squared distances of the feature vectors to their mean.
#[derive(Clone, Debug)]
pub struct DispersionCache {
    n: usize,
    d: usize,
    prefix: Vec<f64>,
    prefix_norm_sq: Vec<f64>,
}

impl DispersionCache {
    /// Builds the cache. `ReproMode::Strict` uses compensated summation.
    pub fn new(features: &FeatureMatrix, repro_mode: ReproMode) -> Result<Self, KsegError> {
        let n = features.n();
        let d = features.d();
        let prefix_len = (n + 1).checked_mul(d).ok_or_else(|| {
            KsegError::resource_limit(format!("prefix cache size overflow: n={n}, d={d}"))
        })?;

        let sums = |values: &[f64]| {
            if repro_mode.compensated_sums() {
                prefix_sums_kahan(values)
            } else {
                prefix_sums(values)
            }
        };

        // Column-major: dimension `dim` occupies `prefix[dim * (n + 1)..][..n + 1]`.
        let values = features.values();
        let mut prefix = Vec::with_capacity(prefix_len);
        let mut column = Vec::with_capacity(n);
        for dim in 0..d {
            column.clear();
            column.extend((0..n).map(|t| values[t * d + dim]));
            prefix.extend(sums(&column));
        }
        let norms: Vec<f64> = (0..n)
            .map(|t| features.row(t).iter().map(|v| v * v).sum())
            .collect();
        let prefix_norm_sq = sums(&norms);

        if let Some(position) = prefix.iter().position(|value| !value.is_finite()) {
            return Err(KsegError::numerical_issue(format!(
                "non-finite feature prefix sum at row {} (dimension {})",
                position % (n + 1),
                position / (n + 1)
            )));
        }
        if let Some(row) = prefix_norm_sq.iter().position(|value| !value.is_finite()) {
            return Err(KsegError::numerical_issue(format!(
                "non-finite squared-norm prefix sum at row {row}"
            )));
        }

        Ok(Self {
            n,
            d,
            prefix,
            prefix_norm_sq,
        })
    }

    pub fn d(&self) -> usize {
        self.d
    }

    fn sum_at(&self, index: usize, dim: usize) -> f64 {
        self.prefix[dim * (self.n + 1) + index]
    }
}

impl SegmentCost for DispersionCache {
    fn len(&self) -> usize {
        self.n
    }

    fn segment_cost(&self, start: usize, end: usize) -> f64 {
        if end <= start + 1 {
            return 0.0;
        }
        let len = (end - start) as f64;
        let mut sum_norm_sq = 0.0;
        for dim in 0..self.d {
            let sum = self.sum_at(end, dim) - self.sum_at(start, dim);
            sum_norm_sq += sum * sum;
        }
        let cost = (self.prefix_norm_sq[end] - self.prefix_norm_sq[start]) - sum_norm_sq / len;
        // Dispersion is non-negative; anything below zero is cancellation error.
        cost.max(0.0)
    }

    fn mean_shift(&self, left: usize, split: usize, right: usize) -> f64 {
        if split <= left || right <= split {
            return 0.0;
        }
        let left_len = (split - left) as f64;
        let right_len = (right - split) as f64;
        let mut score = 0.0;
        for dim in 0..self.d {
            let left_mean = (self.sum_at(split, dim) - self.sum_at(left, dim)) / left_len;
            let right_mean = (self.sum_at(right, dim) - self.sum_at(split, dim)) / right_len;
            let delta = left_mean - right_mean;
            score += delta * delta;
        }
        score
    }
}
