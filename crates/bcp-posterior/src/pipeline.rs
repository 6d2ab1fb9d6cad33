// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::convergence::ConvergenceReport;
use crate::extract::ChangePointResult;
use crate::pooled::PooledPosterior;
use bcp_core::{BcpError, ExecutionContext, ObservationSeries, RunDiagnostics};
use bcp_model::ChangePointModel;
use bcp_sampler::{ConvergencePolicy, Orchestrator, SamplerConfig};
use std::borrow::Cow;
use std::time::Instant;

const ALGORITHM: &str = "metropolis-within-gibbs";

/// Detects the single most probable change point of `series`.
///
/// Builds the model, runs the chains, checks convergence, summarizes the
/// pooled draws and maps the estimate back onto the series. Before/after
/// means are taken over `levels` when given, otherwise over the series
/// values. Under [`ConvergencePolicy::Strict`] convergence warnings fail the
/// run; under `Warn` they are attached to the result.
pub fn detect_change_point(
    series: &ObservationSeries,
    levels: Option<&[f64]>,
    config: &SamplerConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<ChangePointResult, BcpError> {
    config.validate()?;
    if let Some(levels) = levels
        && levels.len() != series.len()
    {
        return Err(BcpError::data(format!(
            "levels length must match series length; levels={}, series={}",
            levels.len(),
            series.len()
        )));
    }

    let started_at = Instant::now();
    let model = ChangePointModel::new(series, config.prior(), ctx.repro_mode)?;
    let chains = Orchestrator::new(&model, config.clone())?.run(ctx)?;

    let convergence = ConvergenceReport::from_chains(&chains, config);
    for warning in &convergence.warnings {
        tracing::warn!(%warning, "convergence diagnostic");
    }
    if config.convergence_policy == ConvergencePolicy::Strict && convergence.has_warnings() {
        let details: Vec<String> = convergence.warnings.iter().map(ToString::to_string).collect();
        return Err(BcpError::not_converged(details.join("; ")));
    }

    let pooled = PooledPosterior::from_chains(&chains);
    let summary = pooled.summarize(series.len(), config.credible_mass)?;

    let mut notes = vec![
        format!(
            "chains={}, draws={}, tune_steps={}",
            config.chains, config.draws, config.tune_steps
        ),
        format!("pooled_draws={}", pooled.len()),
    ];
    if let Some(max_r_hat) = convergence.max_r_hat() {
        notes.push(format!("max_r_hat={max_r_hat:.4}"));
    }
    notes.extend(chains.warnings().iter().map(ToString::to_string));

    let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
    let diagnostics = RunDiagnostics {
        n: series.len(),
        runtime_ms: Some(runtime_ms),
        notes,
        algorithm: Cow::Borrowed(ALGORITHM),
        model: Cow::Borrowed(model.name()),
        seed: Some(config.seed),
        repro_mode: ctx.repro_mode,
        thread_count: Some(chains.thread_count()),
        chains: chains.len(),
        draws_per_chain: chains.draws_per_chain(),
        tune_steps: config.tune_steps,
        #[cfg(feature = "serde")]
        params_json: serde_json::to_value(config).ok(),
        ..RunDiagnostics::default()
    };

    let result = ChangePointResult::from_summary(
        series,
        levels,
        summary,
        convergence,
        chains.warnings().to_vec(),
        diagnostics,
    )?;

    tracing::info!(
        change_point_index = result.change_point_index,
        tau_mean = result.tau.mean,
        percent_change = result.percent_change,
        convergence_warning = result.convergence_warning,
        runtime_ms,
        "change point extracted"
    );

    Ok(result)
}
