// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use thiserror::Error;

/// Error type shared by every kseg crate.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum KsegError {
    /// A configuration value is out of range. Reported before any computation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// The data violates an ordering, grouping or value requirement.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("numerical issue: {0}")]
    NumericalIssue(String),
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(String),
    #[error("cancelled")]
    Cancelled,
}

impl KsegError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn numerical_issue(message: impl Into<String>) -> Self {
        Self::NumericalIssue(message.into())
    }

    pub fn resource_limit(message: impl Into<String>) -> Self {
        Self::ResourceLimit(message.into())
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }
}
