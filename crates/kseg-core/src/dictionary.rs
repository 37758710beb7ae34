// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::KsegError;
use std::collections::HashMap;

/// Contig ordering taken from a sequence dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContigOrder {
    names: Vec<String>,
    lengths: Vec<Option<u64>>,
    index: HashMap<String, usize>,
}

impl ContigOrder {
    /// Builds an order from contig names alone.
    pub fn new<I, S>(names: I) -> Result<Self, KsegError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(names.into_iter().map(|name| (name.into(), None)))
    }

    /// Builds an order whose contigs also carry their lengths in bases.
    pub fn with_lengths<I, S>(entries: I) -> Result<Self, KsegError>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self::build(
            entries
                .into_iter()
                .map(|(name, length)| (name.into(), Some(length))),
        )
    }

    fn build(entries: impl Iterator<Item = (String, Option<u64>)>) -> Result<Self, KsegError> {
        let mut names = vec![];
        let mut lengths = vec![];
        let mut index = HashMap::new();
        for (name, length) in entries {
            if name.is_empty() {
                return Err(KsegError::invalid_input(
                    "contig order entries must have non-empty names",
                ));
            }
            if length == Some(0) {
                return Err(KsegError::invalid_input(format!(
                    "contig {name} has length 0"
                )));
            }
            if index.insert(name.clone(), names.len()).is_some() {
                return Err(KsegError::invalid_input(format!(
                    "contig {name} appears more than once in the contig order"
                )));
            }
            names.push(name);
            lengths.push(length);
        }
        Ok(Self {
            names,
            lengths,
            index,
        })
    }

    pub fn index_of(&self, contig: &str) -> Option<usize> {
        self.index.get(contig).copied()
    }

    pub fn length_of(&self, contig: &str) -> Option<u64> {
        self.index_of(contig).and_then(|idx| self.lengths[idx])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
