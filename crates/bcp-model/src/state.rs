// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use bcp_core::{BcpError, Parameter};

/// One point of the joint parameter space.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterState {
    /// Break index; observations `< tau` use `mu1`, the rest use `mu2`.
    pub tau: usize,
    pub mu1: f64,
    pub mu2: f64,
    pub sigma: f64,
}

impl ParameterState {
    /// Reads a parameter as `f64` (tau is widened).
    pub fn value(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Tau => self.tau as f64,
            Parameter::Mu1 => self.mu1,
            Parameter::Mu2 => self.mu2,
            Parameter::Sigma => self.sigma,
        }
    }

    /// Returns a copy with one continuous parameter replaced.
    ///
    /// Tau is discrete and is never set through this path.
    pub fn with_continuous(mut self, parameter: Parameter, value: f64) -> Self {
        match parameter {
            Parameter::Tau => {}
            Parameter::Mu1 => self.mu1 = value,
            Parameter::Mu2 => self.mu2 = value,
            Parameter::Sigma => self.sigma = value,
        }
        self
    }

    /// True when tau indexes the series and sigma is a positive finite scale.
    pub fn is_valid(&self, n: usize) -> bool {
        self.tau < n
            && self.mu1.is_finite()
            && self.mu2.is_finite()
            && self.sigma.is_finite()
            && self.sigma > 0.0
    }

    pub fn validate(&self, n: usize) -> Result<(), BcpError> {
        if self.tau >= n {
            return Err(BcpError::data(format!(
                "tau={} out of range for series of length {n}",
                self.tau
            )));
        }
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(BcpError::numerical(format!(
                "sigma must be finite and > 0; got {}",
                self.sigma
            )));
        }
        if !self.mu1.is_finite() || !self.mu2.is_finite() {
            return Err(BcpError::numerical(format!(
                "means must be finite; got mu1={}, mu2={}",
                self.mu1, self.mu2
            )));
        }
        Ok(())
    }
}
