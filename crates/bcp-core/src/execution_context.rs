// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::BcpError;
use crate::constraints::Constraints;
use crate::control::CancelToken;
use crate::observability::{ProgressSink, TelemetrySink};
use crate::repro::ReproMode;
use std::time::Instant;

/// Unified execution context passed through sampler and orchestrator calls.
///
/// Everything it borrows is `Sync`, so one context is shared by all chains.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub constraints: &'a Constraints,
    pub cancel: Option<&'a CancelToken>,
    pub repro_mode: ReproMode,
    pub progress: Option<&'a dyn ProgressSink>,
    pub telemetry: Option<&'a dyn TelemetrySink>,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with safe defaults and no optional hooks.
    pub fn new(constraints: &'a Constraints) -> Self {
        Self {
            constraints,
            cancel: None,
            repro_mode: ReproMode::Balanced,
            progress: None,
            telemetry: None,
        }
    }

    /// Sets the optional cancellation token.
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sets the reproducibility mode.
    pub fn with_repro_mode(mut self, repro_mode: ReproMode) -> Self {
        self.repro_mode = repro_mode;
        self
    }

    /// Sets an optional progress sink.
    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets an optional telemetry sink.
    pub fn with_telemetry_sink(mut self, telemetry: &'a dyn TelemetrySink) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Returns true when cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }

    /// Returns a cancelled error when cancellation has been requested.
    pub fn check_cancelled(&self) -> Result<(), BcpError> {
        if self.is_cancelled() {
            return Err(BcpError::cancelled());
        }
        Ok(())
    }

    /// Checks cancellation every `every` iterations.
    ///
    /// When `every` is zero, it is treated as one (always poll).
    pub fn check_cancelled_every(&self, iteration: usize, every: usize) -> Result<(), BcpError> {
        let every = every.max(1);
        if !iteration.is_multiple_of(every) {
            return Ok(());
        }
        self.check_cancelled()
    }

    /// Fails with a timeout once the wall-clock budget has elapsed.
    pub fn check_time_budget(&self, started_at: Instant) -> Result<(), BcpError> {
        let Some(limit_ms) = self.constraints.time_budget_ms else {
            return Ok(());
        };

        let elapsed_ms = started_at.elapsed().as_millis();
        if elapsed_ms <= u128::from(limit_ms) {
            return Ok(());
        }

        Err(BcpError::timeout(format!(
            "constraints.time_budget_ms exceeded: elapsed_ms={elapsed_ms}, limit_ms={limit_ms}"
        )))
    }

    /// Fails with a timeout once a chain has used more sweeps than allowed.
    pub fn check_sweep_budget(&self, sweeps: usize) -> Result<(), BcpError> {
        let Some(limit) = self.constraints.max_sweeps_per_chain else {
            return Ok(());
        };

        if sweeps <= limit {
            return Ok(());
        }

        Err(BcpError::timeout(format!(
            "constraints.max_sweeps_per_chain exceeded: used={sweeps}, limit={limit}"
        )))
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

#[cfg(test)]
mod tests {
    use super::ExecutionContext;
    use crate::constraints::Constraints;
    use crate::control::CancelToken;
    use crate::observability::{ProgressSink, TelemetrySink};
    use crate::repro::ReproMode;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct MockProgressSink {
        values: Mutex<Vec<f32>>,
    }

    impl ProgressSink for MockProgressSink {
        fn on_progress(&self, fraction: f32) {
            self.values
                .lock()
                .expect("progress mutex should lock")
                .push(fraction);
        }
    }

    #[derive(Default)]
    struct MockTelemetrySink {
        values: Mutex<Vec<(&'static str, f64)>>,
    }

    impl TelemetrySink for MockTelemetrySink {
        fn record_scalar(&self, key: &'static str, value: f64) {
            self.values
                .lock()
                .expect("telemetry mutex should lock")
                .push((key, value));
        }
    }

    #[test]
    fn execution_context_new_sets_expected_defaults() {
        let constraints = Constraints::default();
        let ctx = ExecutionContext::new(&constraints);

        assert!(std::ptr::eq(ctx.constraints, &constraints));
        assert!(ctx.cancel.is_none());
        assert_eq!(ctx.repro_mode, ReproMode::Balanced);
        assert!(ctx.progress.is_none());
        assert!(ctx.telemetry.is_none());
    }

    #[test]
    fn builder_methods_set_requested_fields() {
        let constraints = Constraints::default();
        let cancel = CancelToken::new();
        let progress = MockProgressSink::default();
        let telemetry = MockTelemetrySink::default();

        let ctx = ExecutionContext::new(&constraints)
            .with_cancel(&cancel)
            .with_repro_mode(ReproMode::Strict)
            .with_progress_sink(&progress)
            .with_telemetry_sink(&telemetry);

        assert!(ctx.cancel.is_some_and(|token| std::ptr::eq(token, &cancel)));
        assert_eq!(ctx.repro_mode, ReproMode::Strict);
        assert!(ctx.progress.is_some());
        assert!(ctx.telemetry.is_some());
    }

    #[test]
    fn check_cancelled_returns_cancelled_error_when_requested() {
        let constraints = Constraints::default();
        let cancel = CancelToken::new();
        let ctx = ExecutionContext::new(&constraints).with_cancel(&cancel);

        assert!(ctx.check_cancelled().is_ok());
        cancel.cancel();

        let err = ctx
            .check_cancelled()
            .expect_err("cancelled token should return an error");
        assert_eq!(err.to_string(), "cancelled");
    }

    #[test]
    fn check_cancelled_every_zero_interval_is_treated_as_always_poll() {
        let constraints = Constraints::default();
        let cancel = CancelToken::new();
        let ctx = ExecutionContext::new(&constraints).with_cancel(&cancel);

        cancel.cancel();
        assert!(ctx.check_cancelled_every(3, 4).is_ok());
        let err = ctx
            .check_cancelled_every(3, 0)
            .expect_err("every=0 should behave like every=1");
        assert_eq!(err.to_string(), "cancelled");
    }

    #[test]
    fn check_time_budget_without_limit_always_passes() {
        let constraints = Constraints::default();
        let ctx = ExecutionContext::new(&constraints);
        let started_at = Instant::now()
            .checked_sub(Duration::from_millis(50))
            .expect("checked_sub should produce a valid earlier instant");
        ctx.check_time_budget(started_at)
            .expect("no limit must pass");
    }

    #[test]
    fn check_time_budget_over_limit_returns_timeout() {
        let constraints = Constraints {
            time_budget_ms: Some(1),
            ..Constraints::default()
        };
        let ctx = ExecutionContext::new(&constraints);
        let started_at = Instant::now()
            .checked_sub(Duration::from_millis(20))
            .expect("checked_sub should produce a valid earlier instant");

        let err = ctx
            .check_time_budget(started_at)
            .expect_err("time budget exceed must fail");
        assert_eq!(err.code(), "timeout");
        assert!(err.to_string().contains("limit_ms=1"));
    }

    #[test]
    fn check_sweep_budget_allows_limit_and_rejects_beyond() {
        let constraints = Constraints {
            max_sweeps_per_chain: Some(10),
            ..Constraints::default()
        };
        let ctx = ExecutionContext::new(&constraints);
        ctx.check_sweep_budget(10).expect("at limit should pass");
        let err = ctx
            .check_sweep_budget(11)
            .expect_err("over limit must fail");
        assert_eq!(
            err.to_string(),
            "timeout: constraints.max_sweeps_per_chain exceeded: used=11, limit=10"
        );
    }

    #[test]
    fn report_progress_clamps_and_ignores_non_finite_values() {
        let constraints = Constraints::default();
        let progress = MockProgressSink::default();
        let ctx = ExecutionContext::new(&constraints).with_progress_sink(&progress);

        ctx.report_progress(-0.2);
        ctx.report_progress(0.25);
        ctx.report_progress(1.2);
        ctx.report_progress(f32::NAN);
        ctx.report_progress(f32::INFINITY);

        let got = progress
            .values
            .lock()
            .expect("progress values should lock")
            .clone();
        assert_eq!(got, vec![0.0, 0.25, 1.0]);
    }

    #[test]
    fn record_scalar_writes_to_telemetry_sink_when_present() {
        let constraints = Constraints::default();
        let telemetry = MockTelemetrySink::default();
        let ctx = ExecutionContext::new(&constraints).with_telemetry_sink(&telemetry);

        ctx.record_scalar("sampler.runtime_ms", 1.5);
        ctx.record_scalar("sampler.chain.sweeps", 2.0);

        let got = telemetry
            .values
            .lock()
            .expect("telemetry values should lock")
            .clone();
        assert_eq!(got, vec![("sampler.runtime_ms", 1.5), ("sampler.chain.sweeps", 2.0)]);
    }
}
