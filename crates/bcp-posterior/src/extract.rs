// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::convergence::ConvergenceReport;
use crate::summary::{ParameterSummary, PosteriorSummary, TauSummary};
use bcp_core::{BcpError, ObservationSeries, RunDiagnostics, RunWarning};

/// Means of the level values on each side of the break.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelMeans {
    pub before: f64,
    pub after: f64,
    pub before_count: usize,
    pub after_count: usize,
}

/// Splits `levels` at `tau` (`[0, tau)` before, `[tau, len)` after) and
/// averages each side.
pub fn level_means(levels: &[f64], tau: usize) -> Result<LevelMeans, BcpError> {
    if tau == 0 {
        return Err(BcpError::data(
            "change point at index 0 leaves the before group empty",
        ));
    }
    if tau >= levels.len() {
        return Err(BcpError::data(format!(
            "change point index {tau} leaves the after group empty; levels length is {}",
            levels.len()
        )));
    }

    let (before, after) = levels.split_at(tau);
    Ok(LevelMeans {
        before: before.iter().sum::<f64>() / before.len() as f64,
        after: after.iter().sum::<f64>() / after.len() as f64,
        before_count: before.len(),
        after_count: after.len(),
    })
}

/// `(after - before) / before * 100`; undefined for a zero before-mean.
pub fn percent_change(before: f64, after: f64) -> Result<f64, BcpError> {
    if before == 0.0 {
        return Err(BcpError::data(
            "percent change is undefined: before-group mean is zero",
        ));
    }
    let change = (after - before) / before * 100.0;
    if !change.is_finite() {
        return Err(BcpError::numerical(format!(
            "percent change is not finite: before={before}, after={after}"
        )));
    }
    Ok(change)
}

/// Outcome of one change-point detection run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ChangePointResult {
    pub change_point_index: usize,
    pub change_point_timestamp: i64,
    pub tau: TauSummary,
    pub mu1: ParameterSummary,
    pub mu2: ParameterSummary,
    pub sigma: ParameterSummary,
    pub before_mean: f64,
    pub after_mean: f64,
    pub percent_change: f64,
    /// True when any convergence diagnostic crossed its threshold.
    pub convergence_warning: bool,
    pub convergence: ConvergenceReport,
    /// Every warning of the run: convergence and stuck-sampler alike.
    pub warnings: Vec<RunWarning>,
    pub diagnostics: RunDiagnostics,
}

impl ChangePointResult {
    /// Maps the pooled summary back onto the series.
    ///
    /// `levels` are the values the before/after means are taken over (e.g.
    /// prices behind a return series); the modelled values are used when
    /// absent.
    pub fn from_summary(
        series: &ObservationSeries,
        levels: Option<&[f64]>,
        summary: PosteriorSummary,
        convergence: ConvergenceReport,
        sampler_warnings: Vec<RunWarning>,
        diagnostics: RunDiagnostics,
    ) -> Result<Self, BcpError> {
        let levels = levels.unwrap_or(series.values());
        if levels.len() != series.len() {
            return Err(BcpError::data(format!(
                "levels length must match series length; levels={}, series={}",
                levels.len(),
                series.len()
            )));
        }

        let index = summary.tau.index;
        let timestamp = series.timestamp_at(index)?;
        let means = level_means(levels, index)?;
        let change = percent_change(means.before, means.after)?;

        let mut warnings = sampler_warnings;
        warnings.extend(convergence.warnings.iter().cloned());

        Ok(Self {
            change_point_index: index,
            change_point_timestamp: timestamp,
            tau: summary.tau,
            mu1: summary.mu1,
            mu2: summary.mu2,
            sigma: summary.sigma,
            before_mean: means.before,
            after_mean: means.after,
            percent_change: change,
            convergence_warning: convergence.has_warnings(),
            convergence,
            warnings,
            diagnostics,
        })
    }
}
