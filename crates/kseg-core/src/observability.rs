// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Receives run progress in `[0, 1]`. Called from worker threads.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, fraction: f32);
}

/// Receives named scalar measurements. Called from worker threads.
pub trait TelemetrySink: Send + Sync {
    fn record_scalar(&self, key: &'static str, value: f64);
}
