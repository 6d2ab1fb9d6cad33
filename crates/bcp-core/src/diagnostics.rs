// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::repro::ReproMode;
use std::borrow::Cow;

/// Diagnostics schema version for change-point run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Structured metadata captured from one inference run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RunDiagnostics {
    pub n: usize,
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub runtime_ms: Option<u64>,
    pub notes: Vec<String>,
    pub algorithm: Cow<'static, str>,
    pub model: Cow<'static, str>,
    pub seed: Option<u64>,
    pub repro_mode: ReproMode,
    pub thread_count: Option<usize>,
    pub chains: usize,
    pub draws_per_chain: usize,
    pub tune_steps: usize,
    #[cfg(feature = "serde")]
    pub params_json: Option<serde_json::Value>,
}

impl Default for RunDiagnostics {
    fn default() -> Self {
        Self {
            n: 0,
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            runtime_ms: None,
            notes: vec![],
            algorithm: Cow::Borrowed(""),
            model: Cow::Borrowed(""),
            seed: None,
            repro_mode: ReproMode::Balanced,
            thread_count: None,
            chains: 0,
            draws_per_chain: 0,
            tune_steps: 0,
            #[cfg(feature = "serde")]
            params_json: None,
        }
    }
}
