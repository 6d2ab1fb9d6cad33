// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::summary::{ParameterSummary, PosteriorSummary, TauSummary};
use bcp_core::{BcpError, Parameter};
use bcp_sampler::ChainSet;

/// Draws of all chains concatenated in chain-id order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PooledPosterior {
    tau: Vec<usize>,
    mu1: Vec<f64>,
    mu2: Vec<f64>,
    sigma: Vec<f64>,
}

impl PooledPosterior {
    pub fn from_chains(chains: &ChainSet) -> Self {
        let total = chains.chains().iter().map(|chain| chain.draws().len()).sum();
        let mut pooled = Self {
            tau: Vec::with_capacity(total),
            mu1: Vec::with_capacity(total),
            mu2: Vec::with_capacity(total),
            sigma: Vec::with_capacity(total),
        };
        for chain in chains.chains() {
            let draws = chain.draws();
            pooled.tau.extend_from_slice(&draws.tau);
            pooled.mu1.extend_from_slice(&draws.mu1);
            pooled.mu2.extend_from_slice(&draws.mu2);
            pooled.sigma.extend_from_slice(&draws.sigma);
        }
        pooled
    }

    pub fn len(&self) -> usize {
        self.tau.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tau.is_empty()
    }

    pub fn tau(&self) -> &[usize] {
        &self.tau
    }

    /// Pooled draws of a continuous parameter; empty for tau.
    pub fn continuous(&self, parameter: Parameter) -> &[f64] {
        match parameter {
            Parameter::Tau => &[],
            Parameter::Mu1 => &self.mu1,
            Parameter::Mu2 => &self.mu2,
            Parameter::Sigma => &self.sigma,
        }
    }

    /// Summaries of every parameter for a series of length `n`.
    pub fn summarize(&self, n: usize, mass: f64) -> Result<PosteriorSummary, BcpError> {
        Ok(PosteriorSummary {
            tau: TauSummary::from_draws(&self.tau, n, mass)?,
            mu1: ParameterSummary::from_draws(Parameter::Mu1, &self.mu1, mass)?,
            mu2: ParameterSummary::from_draws(Parameter::Mu2, &self.mu2, mass)?,
            sigma: ParameterSummary::from_draws(Parameter::Sigma, &self.sigma, mass)?,
        })
    }
}
