// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::prior::{LOG_2PI, PriorConfig, half_normal_log_pdf, normal_log_pdf, tau_log_prior};
use crate::state::ParameterState;
use bcp_core::{
    BcpError, ObservationSeries, ReproMode, prefix_sum_squares, prefix_sum_squares_kahan,
    prefix_sums, prefix_sums_kahan,
};

/// Joint log-density contract consumed by the chain sampler.
pub trait PosteriorModel: Send + Sync {
    /// Number of observations; tau ranges over `[0, n - 1]`.
    fn n(&self) -> usize;

    /// Per-component breakdown of the joint log-density.
    fn log_density_terms(&self, state: &ParameterState) -> DensityTerms;

    /// Joint log-density; negative infinity for invalid or non-finite states.
    fn log_density(&self, state: &ParameterState) -> f64 {
        self.log_density_terms(state).total()
    }
}

/// Components of the joint log-density at one state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityTerms {
    pub tau: f64,
    pub mu1: f64,
    pub mu2: f64,
    pub sigma: f64,
    pub likelihood: f64,
}

impl DensityTerms {
    /// Sum of all components, mapping NaN to negative infinity.
    pub fn total(&self) -> f64 {
        let total = self.tau + self.mu1 + self.mu2 + self.sigma + self.likelihood;
        if total.is_nan() || total == f64::INFINITY {
            return f64::NEG_INFINITY;
        }
        total
    }

    /// Names of the components that are not finite.
    pub fn non_finite_terms(&self) -> Vec<&'static str> {
        [
            ("tau", self.tau),
            ("mu1", self.mu1),
            ("mu2", self.mu2),
            ("sigma", self.sigma),
            ("likelihood", self.likelihood),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Prefix-stat cache for O(1) segment log-likelihood queries.
///
/// Values are centred on the series mean before accumulation so that
/// `S2 - 2 mu S1 + m mu^2` does not cancel catastrophically for level data.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelCache {
    prefix_sum: Vec<f64>,
    prefix_sum_sq: Vec<f64>,
    shift: f64,
    n: usize,
}

impl ModelCache {
    pub fn new(series: &ObservationSeries, repro_mode: ReproMode) -> Self {
        let shift = series.mean();
        let centred: Vec<f64> = series.values().iter().map(|&x| x - shift).collect();
        let (prefix_sum, prefix_sum_sq) = match repro_mode {
            ReproMode::Strict => (
                prefix_sums_kahan(&centred),
                prefix_sum_squares_kahan(&centred),
            ),
            ReproMode::Balanced | ReproMode::Fast => {
                (prefix_sums(&centred), prefix_sum_squares(&centred))
            }
        };
        Self {
            prefix_sum,
            prefix_sum_sq,
            shift,
            n: series.len(),
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// `sum_{start <= i < end} log N(x_i | mu, sigma^2)`; zero for an empty segment.
    pub fn segment_log_likelihood(&self, start: usize, end: usize, mu: f64, sigma: f64) -> f64 {
        debug_assert!(start <= end && end <= self.n);
        if start == end {
            return 0.0;
        }
        let m = (end - start) as f64;
        let s1 = self.prefix_sum[end] - self.prefix_sum[start];
        let s2 = self.prefix_sum_sq[end] - self.prefix_sum_sq[start];
        let mu = mu - self.shift;
        let ss = (s2 - 2.0 * mu * s1 + m * mu * mu).max(0.0);
        -m * sigma.ln() - 0.5 * m * LOG_2PI - ss / (2.0 * sigma * sigma)
    }

    /// Sample mean of a non-empty segment.
    pub fn segment_mean(&self, start: usize, end: usize) -> Option<f64> {
        if start >= end || end > self.n {
            return None;
        }
        let m = (end - start) as f64;
        Some((self.prefix_sum[end] - self.prefix_sum[start]) / m + self.shift)
    }

    /// Sample standard deviation (n - 1 denominator) of the whole series.
    pub fn std_dev(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        let n = self.n as f64;
        let s1 = self.prefix_sum[self.n];
        let s2 = self.prefix_sum_sq[self.n];
        ((s2 - s1 * s1 / n).max(0.0) / (n - 1.0)).sqrt()
    }
}

/// Normal mean-shift model with one break, shared variance.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangePointModel {
    prior: PriorConfig,
    cache: ModelCache,
}

impl ChangePointModel {
    pub fn new(
        series: &ObservationSeries,
        prior: PriorConfig,
        repro_mode: ReproMode,
    ) -> Result<Self, BcpError> {
        prior.validate()?;
        Ok(Self {
            prior,
            cache: ModelCache::new(series, repro_mode),
        })
    }

    pub fn prior(&self) -> &PriorConfig {
        &self.prior
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn name(&self) -> &'static str {
        "normal-mean-shift"
    }

    /// Log-likelihood of the data; mu1 for indices `< tau`, mu2 otherwise.
    pub fn log_likelihood(&self, state: &ParameterState) -> f64 {
        let n = self.cache.n();
        if state.tau >= n || !state.sigma.is_finite() || state.sigma <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let before = self
            .cache
            .segment_log_likelihood(0, state.tau, state.mu1, state.sigma);
        let after = self
            .cache
            .segment_log_likelihood(state.tau, n, state.mu2, state.sigma);
        let total = before + after;
        if total.is_finite() {
            total
        } else {
            f64::NEG_INFINITY
        }
    }
}

impl PosteriorModel for ChangePointModel {
    fn n(&self) -> usize {
        self.cache.n()
    }

    fn log_density_terms(&self, state: &ParameterState) -> DensityTerms {
        DensityTerms {
            tau: tau_log_prior(state.tau, self.cache.n()),
            mu1: normal_log_pdf(state.mu1, 0.0, self.prior.mu_scale),
            mu2: normal_log_pdf(state.mu2, 0.0, self.prior.mu_scale),
            sigma: half_normal_log_pdf(state.sigma, self.prior.sigma_scale),
            likelihood: self.log_likelihood(state),
        }
    }
}
