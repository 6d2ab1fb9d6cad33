// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use bcp_core::BcpError;

pub(crate) const LOG_2PI: f64 = 1.8378770664093453;
const LN_2: f64 = std::f64::consts::LN_2;

/// Prior tightness for the means and the shared scale.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriorConfig {
    /// Standard deviation of the zero-mean normal prior on `mu1` and `mu2`.
    pub mu_scale: f64,
    /// Scale of the half-normal prior on `sigma`.
    pub sigma_scale: f64,
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            mu_scale: 0.1,
            sigma_scale: 0.1,
        }
    }
}

impl PriorConfig {
    pub fn validate(&self) -> Result<(), BcpError> {
        if !self.mu_scale.is_finite() || self.mu_scale <= 0.0 {
            return Err(BcpError::config(format!(
                "prior_mu_scale must be finite and > 0; got {}",
                self.mu_scale
            )));
        }
        if !self.sigma_scale.is_finite() || self.sigma_scale <= 0.0 {
            return Err(BcpError::config(format!(
                "prior_sigma_scale must be finite and > 0; got {}",
                self.sigma_scale
            )));
        }
        Ok(())
    }
}

/// Log-density of `N(mean, sd^2)` at `x`.
pub fn normal_log_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    if !sd.is_finite() || sd <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let z = (x - mean) / sd;
    -0.5 * LOG_2PI - sd.ln() - 0.5 * z * z
}

/// Log-density of the half-normal distribution with the given scale.
///
/// Zero density (negative infinity) for `x <= 0`.
pub fn half_normal_log_pdf(x: f64, scale: f64) -> f64 {
    if !x.is_finite() || x <= 0.0 || !scale.is_finite() || scale <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let z = x / scale;
    LN_2 - 0.5 * LOG_2PI - scale.ln() - 0.5 * z * z
}

/// Discrete uniform log-prior over `[0, n - 1]`.
pub fn tau_log_prior(tau: usize, n: usize) -> f64 {
    if n == 0 || tau >= n {
        return f64::NEG_INFINITY;
    }
    -(n as f64).ln()
}
