// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Receives run progress as a fraction in `[0, 1]`.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, fraction: f32);
}

/// Receives named scalar measurements.
pub trait TelemetrySink: Send + Sync {
    fn record_scalar(&self, key: &'static str, value: f64);
}

/// Telemetry sink that forwards every scalar to `tracing` at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn record_scalar(&self, key: &'static str, value: f64) {
        tracing::debug!(target: "bcp::telemetry", key, value, "scalar");
    }
}

impl ProgressSink for TracingTelemetrySink {
    fn on_progress(&self, fraction: f32) {
        tracing::trace!(target: "bcp::progress", fraction, "progress");
    }
}
