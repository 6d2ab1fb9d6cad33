// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::Parameter;
use std::fmt;

/// Non-fatal condition accumulated during a run and returned with the result.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Clone, Debug, PartialEq)]
pub enum RunWarning {
    /// Potential scale reduction above the configured threshold.
    ScaleReduction {
        parameter: Parameter,
        r_hat: f64,
        threshold: f64,
    },
    /// Effective sample size below the configured fraction of pooled draws.
    LowEffectiveSampleSize {
        parameter: Parameter,
        ess: f64,
        min_ess: f64,
    },
    /// No proposal for `parameter` was accepted during tuning; the chain is
    /// probably stuck.
    ZeroTuningAcceptance { chain_id: usize, parameter: Parameter },
}

impl RunWarning {
    /// True for the warnings produced by the convergence diagnostics.
    pub fn is_convergence(&self) -> bool {
        matches!(
            self,
            Self::ScaleReduction { .. } | Self::LowEffectiveSampleSize { .. }
        )
    }
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScaleReduction {
                parameter,
                r_hat,
                threshold,
            } => write!(
                f,
                "{parameter}: scale reduction r_hat={r_hat:.4} exceeds threshold={threshold}"
            ),
            Self::LowEffectiveSampleSize {
                parameter,
                ess,
                min_ess,
            } => write!(
                f,
                "{parameter}: effective sample size {ess:.1} below minimum {min_ess:.1}"
            ),
            Self::ZeroTuningAcceptance {
                chain_id,
                parameter,
            } => write!(
                f,
                "chain {chain_id}: {parameter} accepted no proposals during tuning; sampler likely stuck"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RunWarning;
    use crate::Parameter;

    #[test]
    fn convergence_classification() {
        let r_hat = RunWarning::ScaleReduction {
            parameter: Parameter::Mu1,
            r_hat: 1.3,
            threshold: 1.1,
        };
        let stuck = RunWarning::ZeroTuningAcceptance {
            chain_id: 2,
            parameter: Parameter::Sigma,
        };
        assert!(r_hat.is_convergence());
        assert!(!stuck.is_convergence());
        assert_eq!(
            r_hat.to_string(),
            "mu1: scale reduction r_hat=1.3000 exceeds threshold=1.1"
        );
        assert!(stuck.to_string().starts_with("chain 2: sigma"));
    }
}
