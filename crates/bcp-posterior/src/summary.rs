// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use bcp_core::{BcpError, Parameter};

/// Linear-interpolated quantile of ascending-sorted values; NaN when empty.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = pos - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

fn tail_probabilities(mass: f64) -> (f64, f64) {
    let tail = 0.5 * (1.0 - mass);
    (tail, 1.0 - tail)
}

fn mean_and_sd(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}

fn validate_mass(mass: f64) -> Result<(), BcpError> {
    if !(mass > 0.0 && mass < 1.0) {
        return Err(BcpError::config(format!(
            "credible_mass must be in (0, 1); got {mass}"
        )));
    }
    Ok(())
}

/// Posterior mean, spread and central credible interval of a continuous
/// parameter.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSummary {
    pub parameter: Parameter,
    pub mean: f64,
    pub sd: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub ci_mass: f64,
}

impl ParameterSummary {
    pub fn from_draws(parameter: Parameter, draws: &[f64], mass: f64) -> Result<Self, BcpError> {
        validate_mass(mass)?;
        if draws.is_empty() {
            return Err(BcpError::data(format!("no posterior draws for {parameter}")));
        }
        if let Some(bad) = draws.iter().find(|value| !value.is_finite()) {
            return Err(BcpError::numerical(format!(
                "non-finite posterior draw for {parameter}: {bad}"
            )));
        }

        let (mean, sd) = mean_and_sd(draws);
        let mut sorted = draws.to_vec();
        sorted.sort_by(f64::total_cmp);
        let (lo, hi) = tail_probabilities(mass);

        Ok(Self {
            parameter,
            mean,
            sd,
            ci_low: quantile_sorted(&sorted, lo),
            ci_high: quantile_sorted(&sorted, hi),
            ci_mass: mass,
        })
    }
}

/// Posterior summary of the break index.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TauSummary {
    pub mean: f64,
    pub sd: f64,
    /// Posterior mean rounded to the nearest index.
    pub index: usize,
    /// Most frequent index; ties go to the smaller index.
    pub mode: usize,
    pub ci_low: usize,
    pub ci_high: usize,
    pub ci_mass: f64,
}

impl TauSummary {
    /// Summarizes tau draws of a series of length `n`.
    pub fn from_draws(draws: &[usize], n: usize, mass: f64) -> Result<Self, BcpError> {
        validate_mass(mass)?;
        if draws.is_empty() {
            return Err(BcpError::data("no posterior draws for tau"));
        }
        if let Some(&bad) = draws.iter().find(|&&tau| tau >= n) {
            return Err(BcpError::numerical(format!(
                "tau draw {bad} outside [0, {}]",
                n.saturating_sub(1)
            )));
        }

        let values: Vec<f64> = draws.iter().map(|&tau| tau as f64).collect();
        let (mean, sd) = mean_and_sd(&values);
        let index = (mean.round() as usize).min(n - 1);

        let mut counts = vec![0_usize; n];
        for &tau in draws {
            counts[tau] += 1;
        }
        let mode = counts
            .iter()
            .enumerate()
            .fold((0, 0), |best, (idx, &count)| {
                if count > best.1 { (idx, count) } else { best }
            })
            .0;

        let mut sorted = draws.to_vec();
        sorted.sort_unstable();
        let (lo, hi) = tail_probabilities(mass);
        let last = (sorted.len() - 1) as f64;
        let ci_low = sorted[(lo * last).floor() as usize];
        let ci_high = sorted[(hi * last).ceil() as usize];

        Ok(Self {
            mean,
            sd,
            index,
            mode,
            ci_low,
            ci_high,
            ci_mass: mass,
        })
    }

    /// Fraction of draws equal to each index.
    pub fn histogram(draws: &[usize], n: usize) -> Vec<f64> {
        let mut counts = vec![0.0; n];
        for &tau in draws {
            if let Some(slot) = counts.get_mut(tau) {
                *slot += 1.0;
            }
        }
        let total = draws.len().max(1) as f64;
        counts.iter_mut().for_each(|count| *count /= total);
        counts
    }
}

/// Summaries of every parameter.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct PosteriorSummary {
    pub tau: TauSummary,
    pub mu1: ParameterSummary,
    pub mu2: ParameterSummary,
    pub sigma: ParameterSummary,
}
