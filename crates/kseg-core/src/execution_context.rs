// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::control::CancelToken;
use crate::error::KsegError;
use crate::observability::{ProgressSink, TelemetrySink};
use crate::repro::ReproMode;
use std::time::Instant;

/// Execution controls passed through a segmentation run.
///
/// The context is shared by reference with every per-chromosome worker, so
/// all hooks must be thread-safe.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub cancel: Option<&'a CancelToken>,
    pub time_budget_ms: Option<u64>,
    pub repro_mode: ReproMode,
    pub progress: Option<&'a dyn ProgressSink>,
    pub telemetry: Option<&'a dyn TelemetrySink>,
}

impl Default for ExecutionContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with no optional hooks.
    pub fn new() -> Self {
        Self {
            cancel: None,
            time_budget_ms: None,
            repro_mode: ReproMode::Balanced,
            progress: None,
            telemetry: None,
        }
    }

    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Limits the wall-clock time of a run, measured from its start.
    pub fn with_time_budget_ms(mut self, time_budget_ms: u64) -> Self {
        self.time_budget_ms = Some(time_budget_ms);
        self
    }

    pub fn with_repro_mode(mut self, repro_mode: ReproMode) -> Self {
        self.repro_mode = repro_mode;
        self
    }

    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_telemetry_sink(mut self, telemetry: &'a dyn TelemetrySink) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Returns true when cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }

    /// Returns a cancelled error when cancellation has been requested.
    pub fn check_cancelled(&self) -> Result<(), KsegError> {
        if self.is_cancelled() {
            return Err(KsegError::cancelled());
        }
        Ok(())
    }

    /// Returns a resource-limit error once the time budget is spent.
    pub fn check_time_budget(&self, started_at: Instant) -> Result<(), KsegError> {
        let Some(limit_ms) = self.time_budget_ms else {
            return Ok(());
        };

        let elapsed_ms = started_at.elapsed().as_millis();
        if elapsed_ms <= u128::from(limit_ms) {
            return Ok(());
        }
        Err(KsegError::resource_limit(format!(
            "time_budget_ms exceeded: elapsed_ms={elapsed_ms}, limit_ms={limit_ms}"
        )))
    }

    /// Polls cancellation and the time budget every `every` iterations.
    ///
    /// When `every` is zero, it is treated as one (always poll).
    pub fn poll_every(
        &self,
        iteration: usize,
        every: usize,
        started_at: Instant,
    ) -> Result<(), KsegError> {
        if !iteration.is_multiple_of(every.max(1)) {
            return Ok(());
        }
        self.check_cancelled()?;
        self.check_time_budget(started_at)
    }

    /// Emits clamped progress to the sink, if configured.
    pub fn report_progress(&self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }

        if let Some(sink) = self.progress {
            sink.on_progress(fraction.clamp(0.0, 1.0));
        }
    }

    /// Emits a scalar telemetry value to the sink, if configured.
    pub fn record_scalar(&self, key: &'static str, value: f64) {
        if let Some(sink) = self.telemetry {
            sink.record_scalar(key, value);
        }
    }
}
