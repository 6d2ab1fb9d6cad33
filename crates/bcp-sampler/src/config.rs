// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use bcp_core::BcpError;
use bcp_model::{PriorConfig, TauProposal};

const DEFAULT_CHAINS: usize = 4;
const DEFAULT_DRAWS: usize = 2_000;
const DEFAULT_TUNE_STEPS: usize = 1_000;
const DEFAULT_SEED: u64 = 0;
const DEFAULT_TUNE_INTERVAL: usize = 50;
const DEFAULT_CANCEL_CHECK_EVERY: usize = 100;

/// What to do when the convergence diagnostics flag a problem.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConvergencePolicy {
    /// Attach warnings to the result and return it.
    #[default]
    Warn,
    /// Fail the run with a not-converged error.
    Strict,
}

/// Options of one inference run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    pub chains: usize,
    /// Retained draws per chain.
    pub draws: usize,
    /// Tuning sweeps per chain, discarded before drawing.
    pub tune_steps: usize,
    pub seed: u64,
    pub prior_mu_scale: f64,
    pub prior_sigma_scale: f64,
    pub target_acceptance_low: f64,
    pub target_acceptance_high: f64,
    /// R-hat above this value produces a warning.
    pub convergence_threshold: f64,
    /// Sweeps per adaptation batch during tuning.
    pub tune_interval: usize,
    pub tau_step: usize,
    pub tau_resample_prob: f64,
    /// Minimum bulk ESS as a fraction of the pooled draw count.
    pub min_ess_fraction: f64,
    /// Probability mass of the reported equal-tailed credible intervals.
    pub credible_mass: f64,
    pub convergence_policy: ConvergencePolicy,
    pub cancel_check_every: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        let prior = PriorConfig::default();
        let tau = TauProposal::default();
        Self {
            chains: DEFAULT_CHAINS,
            draws: DEFAULT_DRAWS,
            tune_steps: DEFAULT_TUNE_STEPS,
            seed: DEFAULT_SEED,
            prior_mu_scale: prior.mu_scale,
            prior_sigma_scale: prior.sigma_scale,
            target_acceptance_low: 0.20,
            target_acceptance_high: 0.45,
            convergence_threshold: 1.1,
            tune_interval: DEFAULT_TUNE_INTERVAL,
            tau_step: tau.step,
            tau_resample_prob: tau.resample_prob,
            min_ess_fraction: 0.01,
            credible_mass: 0.95,
            convergence_policy: ConvergencePolicy::Warn,
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<(), BcpError> {
        if self.chains == 0 {
            return Err(BcpError::config("chains must be >= 1; got 0"));
        }
        if self.draws == 0 {
            return Err(BcpError::config("draws must be >= 1; got 0"));
        }
        if self.tune_interval == 0 {
            return Err(BcpError::config("tune_interval must be >= 1; got 0"));
        }

        self.prior().validate()?;
        self.tau_proposal().validate()?;

        let (low, high) = (self.target_acceptance_low, self.target_acceptance_high);
        if !(low.is_finite() && high.is_finite() && 0.0 < low && low < high && high < 1.0) {
            return Err(BcpError::config(format!(
                "target acceptance band must satisfy 0 < low < high < 1; got low={low}, high={high}"
            )));
        }

        if !self.convergence_threshold.is_finite() || self.convergence_threshold < 1.0 {
            return Err(BcpError::config(format!(
                "convergence_threshold must be finite and >= 1; got {}",
                self.convergence_threshold
            )));
        }

        if !(0.0..=1.0).contains(&self.min_ess_fraction) {
            return Err(BcpError::config(format!(
                "min_ess_fraction must be in [0, 1]; got {}",
                self.min_ess_fraction
            )));
        }

        if !(self.credible_mass > 0.0 && self.credible_mass < 1.0) {
            return Err(BcpError::config(format!(
                "credible_mass must be in (0, 1); got {}",
                self.credible_mass
            )));
        }

        Ok(())
    }

    pub fn prior(&self) -> PriorConfig {
        PriorConfig {
            mu_scale: self.prior_mu_scale,
            sigma_scale: self.prior_sigma_scale,
        }
    }

    pub fn tau_proposal(&self) -> TauProposal {
        TauProposal {
            step: self.tau_step,
            resample_prob: self.tau_resample_prob,
        }
    }

    pub(crate) fn normalized_cancel_check_every(&self) -> usize {
        self.cancel_check_every.max(1)
    }
}
