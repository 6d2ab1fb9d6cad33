// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use thiserror::Error;

/// Error taxonomy shared by every bcp-rs crate.
///
/// Non-fatal conditions (convergence problems, a stuck sampler) are not
/// errors; they travel as [`crate::RunWarning`] values next to the result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BcpError {
    /// Invalid configuration, raised before any sampling starts.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Invalid observation data or an undefined derived statistic.
    #[error("invalid data: {0}")]
    Data(String),
    /// The sampler reached a state whose log-density is non-finite.
    #[error("numerical issue: {0}")]
    Numerical(String),
    /// Wall-clock or sweep budget exhausted before every chain finished.
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("cancelled")]
    Cancelled,
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(String),
    /// Convergence warnings were raised under the strict convergence policy.
    #[error("not converged: {0}")]
    NotConverged(String),
    /// A fatal error raised inside one chain.
    #[error("chain {chain_id}: {source}")]
    Chain {
        chain_id: usize,
        #[source]
        source: Box<BcpError>,
    },
}

impl BcpError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn numerical(msg: impl Into<String>) -> Self {
        Self::Numerical(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }

    pub fn resource_limit(msg: impl Into<String>) -> Self {
        Self::ResourceLimit(msg.into())
    }

    pub fn not_converged(msg: impl Into<String>) -> Self {
        Self::NotConverged(msg.into())
    }

    /// Attributes an error to the chain that raised it.
    ///
    /// Errors that already carry a chain id are returned unchanged.
    pub fn in_chain(self, chain_id: usize) -> Self {
        match self {
            Self::Chain { .. } => self,
            other => Self::Chain {
                chain_id,
                source: Box::new(other),
            },
        }
    }

    /// Returns the error with any chain attribution removed.
    pub fn root(&self) -> &BcpError {
        match self {
            Self::Chain { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self.root() {
            Self::Config(_) => "config_error",
            Self::Data(_) => "data_error",
            Self::Numerical(_) => "numerical_error",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
            Self::ResourceLimit(_) => "resource_limit",
            Self::NotConverged(_) => "not_converged",
            Self::Chain { .. } => "chain_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BcpError;

    #[test]
    fn display_messages_carry_category_prefix() {
        assert_eq!(
            BcpError::config("SamplerConfig.draws must be >= 1; got 0").to_string(),
            "invalid configuration: SamplerConfig.draws must be >= 1; got 0"
        );
        assert_eq!(
            BcpError::data("series length must be >= 2").to_string(),
            "invalid data: series length must be >= 2"
        );
        assert_eq!(BcpError::cancelled().to_string(), "cancelled");
        assert_eq!(
            BcpError::timeout("time budget exhausted").to_string(),
            "timeout: time budget exhausted"
        );
    }

    #[test]
    fn in_chain_wraps_once_and_preserves_root_code() {
        let err = BcpError::numerical("non-finite log-density").in_chain(3);
        assert_eq!(err.to_string(), "chain 3: numerical issue: non-finite log-density");
        assert_eq!(err.code(), "numerical_error");

        let rewrapped = err.clone().in_chain(7);
        assert_eq!(rewrapped, err);
        assert!(matches!(rewrapped.root(), BcpError::Numerical(_)));
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(BcpError::config("x").code(), "config_error");
        assert_eq!(BcpError::data("x").code(), "data_error");
        assert_eq!(BcpError::timeout("x").code(), "timeout");
        assert_eq!(BcpError::cancelled().code(), "cancelled");
        assert_eq!(BcpError::resource_limit("x").code(), "resource_limit");
        assert_eq!(BcpError::not_converged("x").code(), "not_converged");
    }
}
