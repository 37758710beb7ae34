// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::cost::FeatureMatrix;
use crate::kernel::KernelFunction;
use kseg_core::KsegError;
use rand::SeedableRng;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use statrs::distribution::Normal;

/// Finite feature map whose inner products approximate a kernel.
///
/// The Gaussian kernel uses random Fourier features: `m` frequency vectors
/// `w ~ N(0, I / bandwidth)` are drawn once from a generator seeded with the
/// caller's seed, and an input `x` maps to
/// `sqrt(1/m) * [cos(w_1.x), sin(w_1.x), ..., cos(w_m.x), sin(w_m.x)]`.
/// The linear kernel is represented exactly by the identity map.
///
/// The approximator is immutable once built and can be shared across threads.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureApproximator {
    kernel: KernelFunction,
    input_dimension: usize,
    output_dimension: usize,
    seed: u64,
    frequencies: Vec<f64>,
    scale: f64,
    warnings: Vec<String>,
}

impl FeatureApproximator {
    pub fn new(
        kernel: KernelFunction,
        input_dimension: usize,
        approximation_dimension: usize,
        seed: u64,
    ) -> Result<Self, KsegError> {
        kernel.validate()?;
        if input_dimension == 0 {
            return Err(KsegError::invalid_config(
                "FeatureApproximator input_dimension must be >= 1; got 0",
            ));
        }
        if approximation_dimension == 0 {
            return Err(KsegError::invalid_config(
                "approximation_dimension must be >= 1; got 0",
            ));
        }

        let mut warnings = vec![];
        match kernel {
            KernelFunction::Linear => {
                if approximation_dimension != input_dimension {
                    let warning = format!(
                        "approximation_dimension={approximation_dimension} ignored for the linear kernel; \
                         using exact features of dimension {input_dimension}"
                    );
                    log::warn!("{warning}");
                    warnings.push(warning);
                }
                Ok(Self {
                    kernel,
                    input_dimension,
                    output_dimension: input_dimension,
                    seed,
                    frequencies: vec![],
                    scale: 1.0,
                    warnings,
                })
            }
            KernelFunction::Gaussian { bandwidth } => {
                let frequency_count = approximation_dimension.div_ceil(2);
                let output_dimension = 2 * frequency_count;
                if output_dimension != approximation_dimension {
                    let warning = format!(
                        "approximation_dimension={approximation_dimension} is odd; \
                         using {output_dimension} random Fourier features"
                    );
                    log::warn!("{warning}");
                    warnings.push(warning);
                }

                let normal = Normal::new(0.0, 1.0 / bandwidth.sqrt()).map_err(|err| {
                    KsegError::invalid_config(format!(
                        "cannot sample frequencies for bandwidth {bandwidth}: {err}"
                    ))
                })?;
                let mut rng = StdRng::seed_from_u64(seed);
                let frequencies: Vec<f64> = (0..frequency_count * input_dimension)
                    .map(|_| normal.sample(&mut rng))
                    .collect();

                Ok(Self {
                    kernel,
                    input_dimension,
                    output_dimension,
                    seed,
                    frequencies,
                    scale: (1.0 / frequency_count as f64).sqrt(),
                    warnings,
                })
            }
        }
    }

    pub fn kernel(&self) -> KernelFunction {
        self.kernel
    }

    pub fn input_dimension(&self) -> usize {
        self.input_dimension
    }

    pub fn output_dimension(&self) -> usize {
        self.output_dimension
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Adjustments made to the requested configuration.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Writes the feature vector of `input` into `out`.
    pub fn approximate_into(&self, input: &[f64], out: &mut [f64]) -> Result<(), KsegError> {
        if input.len() != self.input_dimension {
            return Err(KsegError::invalid_input(format!(
                "feature input has dimension {}; expected {}",
                input.len(),
                self.input_dimension
            )));
        }
        if out.len() != self.output_dimension {
            return Err(KsegError::invalid_input(format!(
                "feature output has dimension {}; expected {}",
                out.len(),
                self.output_dimension
            )));
        }
        if let Some(position) = input.iter().position(|value| !value.is_finite()) {
            return Err(KsegError::invalid_input(format!(
                "feature input component {position} is not finite: {}",
                input[position]
            )));
        }

        match self.kernel {
            KernelFunction::Linear => out.copy_from_slice(input),
            KernelFunction::Gaussian { .. } => {
                let rows = self.frequencies.chunks_exact(self.input_dimension);
                for (pair, frequency) in out.chunks_exact_mut(2).zip(rows) {
                    let projection: f64 = frequency
                        .iter()
                        .zip(input.iter())
                        .map(|(w, x)| w * x)
                        .sum();
                    pair[0] = self.scale * projection.cos();
                    pair[1] = self.scale * projection.sin();
                }
            }
        }
        Ok(())
    }

    pub fn approximate(&self, input: &[f64]) -> Result<Vec<f64>, KsegError> {
        let mut out = vec![0.0; self.output_dimension];
        self.approximate_into(input, &mut out)?;
        Ok(out)
    }

    /// Maps row-major inputs (`input_dimension` values per row) to features.
    pub fn featurize(&self, inputs: &[f64]) -> Result<FeatureMatrix, KsegError> {
        if !inputs.len().is_multiple_of(self.input_dimension) {
            return Err(KsegError::invalid_input(format!(
                "input buffer length {} is not a multiple of input_dimension {}",
                inputs.len(),
                self.input_dimension
            )));
        }
        let n = inputs.len() / self.input_dimension;
        let total = n.checked_mul(self.output_dimension).ok_or_else(|| {
            KsegError::resource_limit(format!(
                "feature matrix size overflow: n={n}, d={}",
                self.output_dimension
            ))
        })?;

        let mut values = vec![0.0; total];
        for (row, out) in inputs
            .chunks_exact(self.input_dimension)
            .zip(values.chunks_exact_mut(self.output_dimension))
        {
            self.approximate_into(row, out)?;
        }
        FeatureMatrix::new(n, self.output_dimension, values)
    }
}

#[cfg(test)]
mod tests {
    use super::FeatureApproximator;
    use crate::kernel::KernelFunction;

    fn dot(left: &[f64], right: &[f64]) -> f64 {
        left.iter().zip(right.iter()).map(|(a, b)| a * b).sum()
    }

    #[test]
    fn linear_features_are_exact_and_ignore_dimension() {
        let approx = FeatureApproximator::new(KernelFunction::Linear, 1, 20, 7)
            .expect("linear approximator should build");
        assert_eq!(approx.output_dimension(), 1);
        assert_eq!(approx.warnings().len(), 1);
        assert!(approx.warnings()[0].contains("ignored"));
        assert_eq!(approx.approximate(&[-1.25]).expect("finite input"), vec![-1.25]);

        let quiet = FeatureApproximator::new(KernelFunction::Linear, 1, 1, 7)
            .expect("linear approximator should build");
        assert!(quiet.warnings().is_empty());
    }

    #[test]
    fn gaussian_features_have_requested_dimension_and_unit_norm() {
        let approx =
            FeatureApproximator::new(KernelFunction::Gaussian { bandwidth: 0.05 }, 1, 20, 3)
                .expect("gaussian approximator should build");
        assert_eq!(approx.output_dimension(), 20);
        assert!(approx.warnings().is_empty());

        let features = approx.approximate(&[0.25]).expect("finite input");
        let norm_sq = dot(&features, &features);
        assert!((norm_sq - 1.0).abs() < 1e-12, "norm_sq={norm_sq}");
    }

    #[test]
    fn odd_dimension_rounds_up_with_warning() {
        let approx =
            FeatureApproximator::new(KernelFunction::Gaussian { bandwidth: 1.0 }, 2, 7, 3)
                .expect("gaussian approximator should build");
        assert_eq!(approx.output_dimension(), 8);
        assert_eq!(approx.warnings().len(), 1);
    }

    #[test]
    fn inner_products_approximate_the_kernel() {
        let kernel = KernelFunction::Gaussian { bandwidth: 0.5 };
        let approx =
            FeatureApproximator::new(kernel, 2, 4_000, 11).expect("approximator should build");
        let pairs = [
            ([0.0, 0.0], [0.0, 0.0]),
            ([0.0, 0.0], [0.5, 0.0]),
            ([0.2, -0.3], [0.9, 0.4]),
            ([1.0, 1.0], [-1.0, -1.0]),
        ];
        for (left, right) in pairs {
            let zl = approx.approximate(&left).expect("finite input");
            let zr = approx.approximate(&right).expect("finite input");
            let estimate = dot(&zl, &zr);
            let exact = kernel.evaluate(&left, &right);
            assert!(
                (estimate - exact).abs() < 0.08,
                "estimate={estimate}, exact={exact}"
            );
        }
    }

    #[test]
    fn same_seed_is_bit_identical_and_seed_matters() {
        let kernel = KernelFunction::Gaussian { bandwidth: 0.05 };
        let first = FeatureApproximator::new(kernel, 1, 20, 42).expect("should build");
        let second = FeatureApproximator::new(kernel, 1, 20, 42).expect("should build");
        let other = FeatureApproximator::new(kernel, 1, 20, 43).expect("should build");

        assert_eq!(first, second);
        let x = [0.31];
        let a = first.approximate(&x).expect("finite input");
        let b = second.approximate(&x).expect("finite input");
        let c = other.approximate(&x).expect("finite input");
        assert_eq!(
            a.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            b.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
        assert_ne!(a, c);
    }

    #[test]
    fn rejects_bad_configuration_and_inputs() {
        assert!(FeatureApproximator::new(KernelFunction::Linear, 0, 1, 0).is_err());
        assert!(FeatureApproximator::new(KernelFunction::Linear, 1, 0, 0).is_err());
        assert!(
            FeatureApproximator::new(KernelFunction::Gaussian { bandwidth: -1.0 }, 1, 4, 0)
                .is_err()
        );

        let approx = FeatureApproximator::new(KernelFunction::Linear, 2, 2, 0)
            .expect("approximator should build");
        assert!(approx.approximate(&[1.0]).is_err());
        let err = approx
            .approximate(&[1.0, f64::NAN])
            .expect_err("non-finite must fail");
        assert!(err.to_string().contains("component 1"));
        assert!(approx.featurize(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn featurize_builds_row_major_matrix() {
        let approx = FeatureApproximator::new(KernelFunction::Linear, 1, 1, 0)
            .expect("approximator should build");
        let matrix = approx.featurize(&[1.0, 2.0, 3.0]).expect("featurize should succeed");
        assert_eq!(matrix.n(), 3);
        assert_eq!(matrix.d(), 1);
        assert_eq!(matrix.row(2), &[3.0]);
    }
}
