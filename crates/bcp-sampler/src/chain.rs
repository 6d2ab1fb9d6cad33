// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::SamplerConfig;
use bcp_core::{BcpError, ExecutionContext, Parameter, RunWarning};
use bcp_model::{
    ParameterState, PosteriorModel, ProposalScales, TauProposal, propose_continuous, propose_tau,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::time::Instant;

const ADAPT_GAIN: f64 = 3.0;
const MIN_ADAPT_FACTOR: f64 = 0.1;
const MAX_ADAPT_FACTOR: f64 = 10.0;
const MAX_PREALLOCATED_DRAWS: usize = 1 << 16;

/// Lifecycle of one chain.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainPhase {
    Tuning,
    Drawing,
    Done,
}

/// Proposed/accepted counts for one parameter.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AcceptanceCounter {
    pub proposed: usize,
    pub accepted: usize,
}

impl AcceptanceCounter {
    pub fn record(&mut self, accepted: bool) {
        self.proposed += 1;
        if accepted {
            self.accepted += 1;
        }
    }

    /// Accepted fraction; zero when nothing was proposed.
    pub fn rate(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }
}

/// Acceptance counters for every parameter.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AcceptanceStats {
    counters: [AcceptanceCounter; 4],
}

impl AcceptanceStats {
    pub fn get(&self, parameter: Parameter) -> AcceptanceCounter {
        self.counters[parameter.index()]
    }

    pub fn record(&mut self, parameter: Parameter, accepted: bool) {
        self.counters[parameter.index()].record(accepted);
    }

    pub fn rate(&self, parameter: Parameter) -> f64 {
        self.get(parameter).rate()
    }
}

/// Retained draws of one chain, stored per parameter.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChainDraws {
    pub tau: Vec<usize>,
    pub mu1: Vec<f64>,
    pub mu2: Vec<f64>,
    pub sigma: Vec<f64>,
}

impl ChainDraws {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tau: Vec::with_capacity(capacity),
            mu1: Vec::with_capacity(capacity),
            mu2: Vec::with_capacity(capacity),
            sigma: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, state: &ParameterState) {
        self.tau.push(state.tau);
        self.mu1.push(state.mu1);
        self.mu2.push(state.mu2);
        self.sigma.push(state.sigma);
    }

    pub fn len(&self) -> usize {
        self.tau.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tau.is_empty()
    }

    /// Draws of one parameter as floats (tau converted from its index).
    pub fn values(&self, parameter: Parameter) -> Vec<f64> {
        match parameter {
            Parameter::Tau => self.tau.iter().map(|&tau| tau as f64).collect(),
            Parameter::Mu1 => self.mu1.clone(),
            Parameter::Mu2 => self.mu2.clone(),
            Parameter::Sigma => self.sigma.clone(),
        }
    }

    pub fn state_at(&self, idx: usize) -> Option<ParameterState> {
        Some(ParameterState {
            tau: *self.tau.get(idx)?,
            mu1: *self.mu1.get(idx)?,
            mu2: *self.mu2.get(idx)?,
            sigma: *self.sigma.get(idx)?,
        })
    }
}

/// Per-chain run settings, extracted from [`SamplerConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainSettings {
    pub tune_steps: usize,
    pub draws: usize,
    pub tune_interval: usize,
    pub target_acceptance_low: f64,
    pub target_acceptance_high: f64,
    pub tau_proposal: TauProposal,
    pub cancel_check_every: usize,
}

impl ChainSettings {
    pub fn from_config(config: &SamplerConfig) -> Self {
        Self {
            tune_steps: config.tune_steps,
            draws: config.draws,
            tune_interval: config.tune_interval.max(1),
            target_acceptance_low: config.target_acceptance_low,
            target_acceptance_high: config.target_acceptance_high,
            tau_proposal: config.tau_proposal(),
            cancel_check_every: config.normalized_cancel_check_every(),
        }
    }

    fn target_midpoint(&self) -> f64 {
        0.5 * (self.target_acceptance_low + self.target_acceptance_high)
    }
}

/// A finished chain. Immutable once produced.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    chain_id: usize,
    seed: u64,
    initial_state: ParameterState,
    final_state: ParameterState,
    draws: ChainDraws,
    tuned_scales: ProposalScales,
    tuning_acceptance: AcceptanceStats,
    draw_acceptance: AcceptanceStats,
    warnings: Vec<RunWarning>,
    sweeps: usize,
    runtime_ms: u64,
}

impl Chain {
    pub fn chain_id(&self) -> usize {
        self.chain_id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> ChainPhase {
        ChainPhase::Done
    }

    pub fn initial_state(&self) -> &ParameterState {
        &self.initial_state
    }

    pub fn final_state(&self) -> &ParameterState {
        &self.final_state
    }

    pub fn draws(&self) -> &ChainDraws {
        &self.draws
    }

    /// Proposal scales in effect after tuning.
    pub fn tuned_scales(&self) -> &ProposalScales {
        &self.tuned_scales
    }

    pub fn tuning_acceptance(&self) -> &AcceptanceStats {
        &self.tuning_acceptance
    }

    pub fn draw_acceptance(&self) -> &AcceptanceStats {
        &self.draw_acceptance
    }

    /// Acceptance rate of `parameter` over the retained draws.
    pub fn acceptance_rate(&self, parameter: Parameter) -> f64 {
        self.draw_acceptance.rate(parameter)
    }

    pub fn warnings(&self) -> &[RunWarning] {
        &self.warnings
    }

    /// Total sweeps, tuning included.
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    pub fn runtime_ms(&self) -> u64 {
        self.runtime_ms
    }
}

/// Metropolis-within-Gibbs sampler for one chain.
///
/// Each sweep updates tau, mu1, mu2 and sigma in turn, each with its own
/// proposal and accept/reject step. Tuning sweeps adapt the continuous
/// proposal scales and are discarded; drawing sweeps run with frozen scales
/// and each records one draw.
#[derive(Debug)]
pub struct ChainSampler<'m, M: PosteriorModel> {
    model: &'m M,
    chain_id: usize,
    seed: u64,
    settings: ChainSettings,
    rng: Xoshiro256PlusPlus,
    phase: ChainPhase,
    initial_state: ParameterState,
    state: ParameterState,
    log_density: f64,
    scales: ProposalScales,
    batch: AcceptanceStats,
    tuning: AcceptanceStats,
    drawing: AcceptanceStats,
    draws: ChainDraws,
    sweeps: usize,
}

impl<'m, M: PosteriorModel> ChainSampler<'m, M> {
    /// Builds a chain at `initial_state`.
    ///
    /// Fails with a numerical error naming the offending density terms when
    /// the starting point has a non-finite log-density.
    pub fn new(
        model: &'m M,
        chain_id: usize,
        seed: u64,
        initial_state: ParameterState,
        initial_scales: ProposalScales,
        settings: ChainSettings,
    ) -> Result<Self, BcpError> {
        initial_scales.validate()?;
        settings.tau_proposal.validate()?;
        if settings.draws == 0 {
            return Err(BcpError::config("draws must be >= 1; got 0"));
        }

        let terms = model.log_density_terms(&initial_state);
        let log_density = terms.total();
        if !log_density.is_finite() {
            return Err(BcpError::numerical(format!(
                "non-finite log-density at initial state {initial_state:?}; terms: {}",
                terms.non_finite_terms().join(", ")
            )));
        }

        Ok(Self {
            model,
            chain_id,
            seed,
            settings,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            phase: ChainPhase::Tuning,
            initial_state,
            state: initial_state,
            log_density,
            scales: initial_scales,
            batch: AcceptanceStats::default(),
            tuning: AcceptanceStats::default(),
            drawing: AcceptanceStats::default(),
            draws: ChainDraws::with_capacity(settings.draws.min(MAX_PREALLOCATED_DRAWS)),
            sweeps: 0,
        })
    }

    pub fn phase(&self) -> ChainPhase {
        self.phase
    }

    pub fn state(&self) -> &ParameterState {
        &self.state
    }

    pub fn scales(&self) -> &ProposalScales {
        &self.scales
    }

    /// Runs tuning then drawing to completion.
    ///
    /// `started_at` is the start of the whole run; the time budget in `ctx`
    /// is measured from it.
    pub fn run(mut self, ctx: &ExecutionContext<'_>, started_at: Instant) -> Result<Chain, BcpError> {
        let chain_started = Instant::now();

        tracing::debug!(
            chain_id = self.chain_id,
            tau = self.state.tau,
            mu1 = self.state.mu1,
            mu2 = self.state.mu2,
            sigma = self.state.sigma,
            "chain starting"
        );

        for step in 0..self.settings.tune_steps {
            self.sweep();
            self.check_controls(ctx, started_at)?;
            if (step + 1) % self.settings.tune_interval == 0 {
                self.adapt();
            }
        }

        self.phase = ChainPhase::Drawing;
        for _ in 0..self.settings.draws {
            self.sweep();
            self.check_controls(ctx, started_at)?;
            self.draws.push(&self.state);
        }
        self.phase = ChainPhase::Done;

        let warnings = self.tuning_warnings();
        for warning in &warnings {
            tracing::warn!(chain_id = self.chain_id, %warning, "stuck sampler");
        }

        let runtime_ms = u64::try_from(chain_started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            chain_id = self.chain_id,
            sweeps = self.sweeps,
            runtime_ms,
            acceptance_tau = self.drawing.rate(Parameter::Tau),
            acceptance_mu1 = self.drawing.rate(Parameter::Mu1),
            acceptance_mu2 = self.drawing.rate(Parameter::Mu2),
            acceptance_sigma = self.drawing.rate(Parameter::Sigma),
            "chain finished"
        );

        Ok(Chain {
            chain_id: self.chain_id,
            seed: self.seed,
            initial_state: self.initial_state,
            final_state: self.state,
            draws: self.draws,
            tuned_scales: self.scales,
            tuning_acceptance: self.tuning,
            draw_acceptance: self.drawing,
            warnings,
            sweeps: self.sweeps,
            runtime_ms,
        })
    }

    /// One Gibbs sweep over all parameters.
    fn sweep(&mut self) {
        for parameter in Parameter::ALL {
            let accepted = self.update(parameter);
            match self.phase {
                ChainPhase::Tuning => {
                    self.tuning.record(parameter, accepted);
                    self.batch.record(parameter, accepted);
                }
                ChainPhase::Drawing => self.drawing.record(parameter, accepted),
                ChainPhase::Done => {}
            }
        }
        self.sweeps += 1;
    }

    /// Metropolis-Hastings step for one parameter; true when accepted.
    ///
    /// Candidates with a non-finite log-density are rejected.
    fn update(&mut self, parameter: Parameter) -> bool {
        let proposal = match parameter {
            Parameter::Tau => Some(propose_tau(
                &self.state,
                self.model.n(),
                &self.settings.tau_proposal,
                &mut self.rng,
            )),
            _ => propose_continuous(
                &self.state,
                parameter,
                self.scales.get(parameter),
                &mut self.rng,
            ),
        };
        let Some(proposal) = proposal else {
            return false;
        };

        let candidate_density = self.model.log_density(&proposal.candidate);
        if !candidate_density.is_finite() {
            return false;
        }

        let log_alpha = candidate_density - self.log_density + proposal.log_hastings_ratio;
        let accepted = log_alpha >= 0.0 || self.rng.random::<f64>().ln() < log_alpha;
        if accepted {
            self.state = proposal.candidate;
            self.log_density = candidate_density;
        }
        accepted
    }

    /// Rescales each continuous proposal towards the target acceptance band.
    fn adapt(&mut self) {
        let midpoint = self.settings.target_midpoint();
        for parameter in Parameter::CONTINUOUS {
            let rate = self.batch.rate(parameter);
            let factor =
                (ADAPT_GAIN * (rate - midpoint)).exp().clamp(MIN_ADAPT_FACTOR, MAX_ADAPT_FACTOR);
            self.scales.rescale(parameter, factor);
            tracing::debug!(
                chain_id = self.chain_id,
                parameter = %parameter,
                rate,
                scale = self.scales.get(parameter),
                "tuning batch adapted"
            );
        }
        self.batch = AcceptanceStats::default();
    }

    fn check_controls(
        &self,
        ctx: &ExecutionContext<'_>,
        started_at: Instant,
    ) -> Result<(), BcpError> {
        let every = self.settings.cancel_check_every;
        ctx.check_sweep_budget(self.sweeps)?;
        ctx.check_cancelled_every(self.sweeps, every)?;
        if self.sweeps.is_multiple_of(every.max(1)) {
            ctx.check_time_budget(started_at)?;
        }
        Ok(())
    }

    fn tuning_warnings(&self) -> Vec<RunWarning> {
        if self.settings.tune_steps == 0 {
            return vec![];
        }
        Parameter::ALL
            .into_iter()
            .filter(|&parameter| {
                let counter = self.tuning.get(parameter);
                counter.proposed > 0 && counter.accepted == 0
            })
            .map(|parameter| RunWarning::ZeroTuningAcceptance {
                chain_id: self.chain_id,
                parameter,
            })
            .collect()
    }
}
