// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::state::ParameterState;
use bcp_core::{BcpError, Parameter};
use rand::Rng;
use rand_distr::StandardNormal;

/// Break-index proposal: reflected integer random walk mixed with a uniform
/// redraw from the prior.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TauProposal {
    /// Maximum absolute step of the random walk.
    pub step: usize,
    /// Probability of redrawing tau uniformly instead of walking.
    pub resample_prob: f64,
}

impl Default for TauProposal {
    fn default() -> Self {
        Self {
            step: 1,
            resample_prob: 0.1,
        }
    }
}

impl TauProposal {
    pub fn validate(&self) -> Result<(), BcpError> {
        if self.step == 0 {
            return Err(BcpError::config("tau_step must be >= 1; got 0"));
        }
        if !(0.0..=1.0).contains(&self.resample_prob) {
            return Err(BcpError::config(format!(
                "tau_resample_prob must be in [0, 1]; got {}",
                self.resample_prob
            )));
        }
        Ok(())
    }
}

/// Random-walk standard deviations of the continuous parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProposalScales {
    pub mu1: f64,
    pub mu2: f64,
    pub sigma: f64,
}

impl ProposalScales {
    pub fn uniform(scale: f64) -> Self {
        Self {
            mu1: scale,
            mu2: scale,
            sigma: scale,
        }
    }

    /// Scale of a continuous parameter; tau has no scale and reports zero.
    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Tau => 0.0,
            Parameter::Mu1 => self.mu1,
            Parameter::Mu2 => self.mu2,
            Parameter::Sigma => self.sigma,
        }
    }

    /// Multiplies one scale by `factor`.
    pub fn rescale(&mut self, parameter: Parameter, factor: f64) {
        match parameter {
            Parameter::Tau => {}
            Parameter::Mu1 => self.mu1 *= factor,
            Parameter::Mu2 => self.mu2 *= factor,
            Parameter::Sigma => self.sigma *= factor,
        }
    }

    pub fn validate(&self) -> Result<(), BcpError> {
        for parameter in Parameter::CONTINUOUS {
            let scale = self.get(parameter);
            if !scale.is_finite() || scale <= 0.0 {
                return Err(BcpError::config(format!(
                    "proposal scale for {parameter} must be finite and > 0; got {scale}"
                )));
            }
        }
        Ok(())
    }
}

/// Candidate state plus the log proposal-density ratio `log q(x|x') - log q(x'|x)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Proposal {
    pub candidate: ParameterState,
    pub log_hastings_ratio: f64,
}

/// Folds any integer into `[0, n - 1]` by mirroring at `-0.5` and `n - 0.5`.
///
/// `-1` maps to `0` and `n` to `n - 1`, so for a symmetric step distribution
/// the number of steps taking `i` to `j` equals the number taking `j` to `i`
/// and no Hastings correction is needed.
pub fn reflect_index(raw: i64, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let n = n as i64;
    let period = 2 * n;
    let folded = raw.rem_euclid(period);
    let idx = if folded >= n {
        period - 1 - folded
    } else {
        folded
    };
    idx as usize
}

/// Proposes a new break index for a series of length `n`.
pub fn propose_tau<R: Rng + ?Sized>(
    current: &ParameterState,
    n: usize,
    config: &TauProposal,
    rng: &mut R,
) -> Proposal {
    let tau = if n <= 1 {
        0
    } else if config.resample_prob > 0.0 && rng.random_bool(config.resample_prob) {
        rng.random_range(0..n)
    } else {
        let step = config.step as i64;
        let draw = rng.random_range(0..2 * step);
        let delta = if draw < step { draw - step } else { draw - step + 1 };
        reflect_index(current.tau as i64 + delta, n)
    };

    Proposal {
        candidate: ParameterState { tau, ..*current },
        log_hastings_ratio: 0.0,
    }
}

/// Proposes a Gaussian random-walk move for one continuous parameter.
///
/// Returns `None` when the move is invalid before evaluation (non-positive or
/// non-finite sigma, non-finite mean); the caller counts it as a rejection.
pub fn propose_continuous<R: Rng + ?Sized>(
    current: &ParameterState,
    parameter: Parameter,
    scale: f64,
    rng: &mut R,
) -> Option<Proposal> {
    if !parameter.is_continuous() {
        return None;
    }
    let z: f64 = rng.sample(StandardNormal);
    let value = current.value(parameter) + scale * z;
    if !value.is_finite() || (parameter == Parameter::Sigma && value <= 0.0) {
        return None;
    }
    Some(Proposal {
        candidate: current.with_continuous(parameter, value),
        log_hastings_ratio: 0.0,
    })
}
