// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use bcp_model::{ModelCache, ParameterState, PriorConfig, ProposalScales};
use rand::Rng;

const MIN_SCALE_FRACTION: f64 = 1e-3;

/// Data-driven starting point: random tau, segment means, overall spread.
///
/// An empty segment falls back to the overall mean; a flat series falls
/// back to the prior sigma scale.
pub fn initial_state<R: Rng + ?Sized>(
    cache: &ModelCache,
    prior: &PriorConfig,
    rng: &mut R,
) -> ParameterState {
    let n = cache.n();
    let tau = if n == 0 { 0 } else { rng.random_range(0..n) };
    let overall = cache.segment_mean(0, n).unwrap_or(0.0);
    let mu1 = cache.segment_mean(0, tau).unwrap_or(overall);
    let mu2 = cache.segment_mean(tau, n).unwrap_or(overall);

    let sd = cache.std_dev();
    let sigma = if sd.is_finite() && sd > 0.0 {
        sd
    } else {
        prior.sigma_scale
    };

    ParameterState {
        tau,
        mu1,
        mu2,
        sigma,
    }
}

/// Starting random-walk scales, refined later by tuning.
pub fn initial_scales(cache: &ModelCache, prior: &PriorConfig) -> ProposalScales {
    let sd = cache.std_dev();
    let sd = if sd.is_finite() { sd } else { 0.0 };
    let n = cache.n().max(2) as f64;
    let mu = (sd / (n / 2.0).sqrt()).max(MIN_SCALE_FRACTION * prior.mu_scale);
    let sigma = (sd / n.sqrt()).max(MIN_SCALE_FRACTION * prior.sigma_scale);
    ProposalScales {
        mu1: mu,
        mu2: mu,
        sigma,
    }
}
