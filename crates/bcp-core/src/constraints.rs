// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::BcpError;

/// Run-level resource limits enforced by the orchestrator.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Constraints {
    /// Wall-clock budget for the whole multi-chain run.
    pub time_budget_ms: Option<u64>,
    /// Upper bound on tuning plus drawing sweeps for a single chain.
    pub max_sweeps_per_chain: Option<usize>,
}

impl Constraints {
    pub fn validate(&self) -> Result<(), BcpError> {
        if matches!(self.time_budget_ms, Some(0)) {
            return Err(BcpError::config(
                "constraints.time_budget_ms must be >= 1 when provided; got 0",
            ));
        }
        if matches!(self.max_sweeps_per_chain, Some(0)) {
            return Err(BcpError::config(
                "constraints.max_sweeps_per_chain must be >= 1 when provided; got 0",
            ));
        }
        Ok(())
    }
}
