// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use bcp_core::{Parameter, RunWarning};
use bcp_sampler::{ChainSet, SamplerConfig};

const MIN_HALF_CHAIN_LEN: usize = 2;
const MIN_ESS_HALF_CHAIN_LEN: usize = 4;
const VARIANCE_FLOOR: f64 = 1e-30;

/// Split-chain potential scale reduction for one parameter.
///
/// Every chain is cut in half and the halves are compared as separate
/// chains, so drift inside a chain also inflates the statistic. Returns
/// `None` with fewer than two chains or when a half-chain is too short.
/// Chains that are all constant at the same value give exactly 1.
pub fn split_r_hat(chains: &[&[f64]]) -> Option<f64> {
    if chains.len() < 2 {
        return None;
    }
    let halves = split_halves(chains, MIN_HALF_CHAIN_LEN)?;
    let (b, w, n) = between_within(&halves);

    if w < VARIANCE_FLOOR {
        return Some(if b < VARIANCE_FLOOR { 1.0 } else { f64::INFINITY });
    }

    let var_plus = (n - 1.0) / n * w + b / n;
    Some((var_plus / w).sqrt())
}

/// Multi-chain bulk effective sample size.
///
/// Autocorrelations come from the variogram of split chains against the
/// pooled variance estimate and are truncated with Geyer's initial
/// monotone sequence. The result lies in `[1, total draws]`; a parameter
/// with no variance reports the total draw count.
pub fn ess_bulk(chains: &[&[f64]]) -> f64 {
    let Some(halves) = split_halves(chains, MIN_ESS_HALF_CHAIN_LEN) else {
        return 0.0;
    };
    let n = halves[0].len();
    let total = (halves.len() * n) as f64;

    let (b, w, n_f) = between_within(&halves);
    let var_plus = (n_f - 1.0) / n_f * w + b / n_f;
    if !var_plus.is_finite() || var_plus < VARIANCE_FLOOR {
        return total;
    }

    let mut rho = Vec::new();
    for lag in 1..n {
        let mut sum_sq = 0.0;
        let mut count = 0_usize;
        for half in &halves {
            for (a, b) in half.iter().zip(&half[lag..]) {
                let d = a - b;
                sum_sq += d * d;
                count += 1;
            }
        }
        let variogram = sum_sq / count as f64;
        rho.push((1.0 - variogram / (2.0 * var_plus)).clamp(-1.0, 1.0));

        let k = rho.len();
        if k % 2 == 0 && rho[k - 2] + rho[k - 1] < 0.0 {
            break;
        }
    }

    let mut tau = 1.0;
    let mut previous = f64::INFINITY;
    for pair in rho.chunks_exact(2) {
        let gamma = pair[0] + pair[1];
        if gamma < 0.0 {
            break;
        }
        let gamma = gamma.min(previous);
        tau += 2.0 * gamma;
        previous = gamma;
    }

    if !tau.is_finite() || tau <= 0.0 {
        return total;
    }
    (total / tau).clamp(1.0, total)
}

fn split_halves<'a>(chains: &[&'a [f64]], min_len: usize) -> Option<Vec<&'a [f64]>> {
    if chains.is_empty() {
        return None;
    }
    let shortest = chains.iter().map(|chain| chain.len()).min()?;
    let half_len = shortest / 2;
    if half_len < min_len {
        return None;
    }
    let mut halves = Vec::with_capacity(chains.len() * 2);
    for chain in chains {
        let mid = chain.len() / 2;
        halves.push(&chain[..half_len]);
        halves.push(&chain[mid..mid + half_len]);
    }
    Some(halves)
}

/// Between-chain variance `B`, mean within-chain variance `W` and the
/// common chain length.
fn between_within(chains: &[&[f64]]) -> (f64, f64, f64) {
    let m = chains.len() as f64;
    let n = chains[0].len() as f64;

    let stats: Vec<(f64, f64)> = chains
        .iter()
        .map(|chain| {
            let mean = chain.iter().sum::<f64>() / n;
            let var = chain.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
            (mean, var)
        })
        .collect();

    let grand_mean = stats.iter().map(|(mean, _)| mean).sum::<f64>() / m;
    let b = n / (m - 1.0)
        * stats
            .iter()
            .map(|(mean, _)| (mean - grand_mean) * (mean - grand_mean))
            .sum::<f64>();
    let w = stats.iter().map(|(_, var)| var).sum::<f64>() / m;
    (b, w, n)
}

/// Convergence statistics of one parameter.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterConvergence {
    pub parameter: Parameter,
    pub r_hat: Option<f64>,
    pub ess: f64,
}

/// Convergence diagnostics over a set of chains.
///
/// Tau is reported for information only; warnings come from the continuous
/// parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ConvergenceReport {
    pub parameters: Vec<ParameterConvergence>,
    pub r_hat_threshold: f64,
    pub min_ess: f64,
    pub total_draws: usize,
    pub warnings: Vec<RunWarning>,
}

impl ConvergenceReport {
    /// Diagnoses every parameter of `chains`.
    ///
    /// With a single chain there is no between-chain comparison: every
    /// `r_hat` is `None` and only the effective sample size can warn.
    pub fn from_chains(chains: &ChainSet, config: &SamplerConfig) -> Self {
        let columns: Vec<(Parameter, Vec<Vec<f64>>)> = Parameter::ALL
            .into_iter()
            .map(|parameter| (parameter, chains.parameter_draws(parameter)))
            .collect();
        let total_draws = chains.chains().iter().map(|chain| chain.draws().len()).sum();
        Self::from_draws(&columns, total_draws, config)
    }

    fn from_draws(
        columns: &[(Parameter, Vec<Vec<f64>>)],
        total_draws: usize,
        config: &SamplerConfig,
    ) -> Self {
        let min_ess = config.min_ess_fraction * total_draws as f64;
        let threshold = config.convergence_threshold;
        let mut parameters = Vec::with_capacity(columns.len());
        let mut warnings = Vec::new();

        for (parameter, draws) in columns {
            let chains: Vec<&[f64]> = draws.iter().map(Vec::as_slice).collect();
            let r_hat = split_r_hat(&chains);
            let ess = ess_bulk(&chains);

            if parameter.is_continuous() {
                if let Some(r_hat) = r_hat.filter(|&r_hat| r_hat > threshold) {
                    warnings.push(RunWarning::ScaleReduction {
                        parameter: *parameter,
                        r_hat,
                        threshold,
                    });
                }
                if ess < min_ess {
                    warnings.push(RunWarning::LowEffectiveSampleSize {
                        parameter: *parameter,
                        ess,
                        min_ess,
                    });
                }
            }

            parameters.push(ParameterConvergence {
                parameter: *parameter,
                r_hat,
                ess,
            });
        }

        Self {
            parameters,
            r_hat_threshold: threshold,
            min_ess,
            total_draws,
            warnings,
        }
    }

    pub fn get(&self, parameter: Parameter) -> Option<&ParameterConvergence> {
        self.parameters
            .iter()
            .find(|stats| stats.parameter == parameter)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Largest R-hat among the continuous parameters.
    pub fn max_r_hat(&self) -> Option<f64> {
        self.parameters
            .iter()
            .filter(|stats| stats.parameter.is_continuous())
            .filter_map(|stats| stats.r_hat)
            .reduce(f64::max)
    }
}
