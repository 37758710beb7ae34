// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Neumaier-compensated running sum.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KahanSum {
    sum: f64,
    compensation: f64,
}

impl KahanSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        let next = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - next) + value;
        } else {
            self.compensation += (value - next) + self.sum;
        }
        self.sum = next;
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Returns `n + 1` prefix sums with a leading zero.
pub fn prefix_sums(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len() + 1);
    out.push(0.0);
    let mut running = 0.0;
    for &value in values {
        running += value;
        out.push(running);
    }
    out
}

/// Compensated variant of [`prefix_sums`].
pub fn prefix_sums_kahan(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len() + 1);
    out.push(0.0);
    let mut running = KahanSum::new();
    for &value in values {
        running.add(value);
        out.push(running.value());
    }
    out
}
