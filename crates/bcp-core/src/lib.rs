// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod constraints;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod execution_context;
pub mod numeric;
pub mod observability;
pub mod parameter;
pub mod repro;
pub mod time_series;
pub mod warning;

pub use constraints::Constraints;
pub use control::CancelToken;
pub use diagnostics::{DIAGNOSTICS_SCHEMA_VERSION, RunDiagnostics};
pub use error::BcpError;
pub use execution_context::ExecutionContext;
pub use numeric::{prefix_sum_squares, prefix_sum_squares_kahan, prefix_sums, prefix_sums_kahan};
pub use observability::{ProgressSink, TelemetrySink, TracingTelemetrySink};
pub use parameter::Parameter;
pub use repro::ReproMode;
pub use time_series::ObservationSeries;
pub use warning::RunWarning;

/// Core shared types and traits for bcp-rs.
pub fn crate_name() -> &'static str {
    "bcp-core"
}
