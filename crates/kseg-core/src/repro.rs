// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Reproducibility mode used to control determinism/performance trade-offs.
///
/// `Strict` runs chromosomes sequentially and uses compensated prefix sums.
/// `Balanced` allows per-chromosome parallelism; its output does not depend
/// on the thread count either.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReproMode {
    Strict,
    #[default]
    Balanced,
}

impl ReproMode {
    pub fn allows_parallelism(self) -> bool {
        matches!(self, Self::Balanced)
    }

    pub fn compensated_sums(self) -> bool {
        matches!(self, Self::Strict)
    }
}
