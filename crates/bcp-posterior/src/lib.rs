// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod convergence;
pub mod extract;
pub mod pipeline;
pub mod pooled;
pub mod summary;

pub use convergence::{ConvergenceReport, ParameterConvergence, ess_bulk, split_r_hat};
pub use extract::{ChangePointResult, LevelMeans, level_means, percent_change};
pub use pipeline::detect_change_point;
pub use pooled::PooledPosterior;
pub use summary::{ParameterSummary, PosteriorSummary, TauSummary, quantile_sorted};

/// Posterior analysis namespace.
pub fn crate_name() -> &'static str {
    let _ = bcp_sampler::crate_name();
    "bcp-posterior"
}
