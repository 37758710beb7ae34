// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::KsegError;
use std::fmt;

/// A 1-based, closed genomic interval `contig:start-end`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenomicInterval {
    pub contig: String,
    pub start: u64,
    pub end: u64,
}

impl GenomicInterval {
    /// Builds an interval, rejecting `start == 0` and `start > end`.
    pub fn new(contig: impl Into<String>, start: u64, end: u64) -> Result<Self, KsegError> {
        let interval = Self {
            contig: contig.into(),
            start,
            end,
        };
        interval.validate()?;
        Ok(interval)
    }

    pub fn validate(&self) -> Result<(), KsegError> {
        if self.contig.is_empty() {
            return Err(KsegError::invalid_input("interval contig must be non-empty"));
        }
        if self.start == 0 {
            return Err(KsegError::invalid_input(format!(
                "interval {self} has start=0; coordinates are 1-based"
            )));
        }
        if self.start > self.end {
            return Err(KsegError::invalid_input(format!(
                "interval {self} has start > end"
            )));
        }
        Ok(())
    }

    /// Number of bases covered.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// True when `other` starts on the base right after this interval ends.
    pub fn abuts(&self, other: &Self) -> bool {
        self.contig == other.contig && self.end.checked_add(1) == Some(other.start)
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.contig == other.contig && self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}
