// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::chain::{Chain, ChainSampler, ChainSettings};
use crate::config::SamplerConfig;
use crate::init::{initial_scales, initial_state};
use crate::seeds::{chain_seed, init_seed};
#[cfg(feature = "rayon")]
use bcp_core::ReproMode;
use bcp_core::{BcpError, ExecutionContext, Parameter, RunWarning};
use bcp_model::ChangePointModel;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Completed chains of one run, ordered by chain id.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ChainSet {
    chains: Vec<Chain>,
    warnings: Vec<RunWarning>,
    runtime_ms: u64,
    thread_count: usize,
}

impl ChainSet {
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn into_chains(self) -> Vec<Chain> {
        self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Retained draws per chain.
    pub fn draws_per_chain(&self) -> usize {
        self.chains.first().map_or(0, |chain| chain.draws().len())
    }

    /// Draws of one parameter, one vector per chain.
    pub fn parameter_draws(&self, parameter: Parameter) -> Vec<Vec<f64>> {
        self.chains
            .iter()
            .map(|chain| chain.draws().values(parameter))
            .collect()
    }

    /// Stuck-sampler warnings collected from every chain.
    pub fn warnings(&self) -> &[RunWarning] {
        &self.warnings
    }

    pub fn runtime_ms(&self) -> u64 {
        self.runtime_ms
    }

    /// Worker threads used; one when chains ran sequentially.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }
}

/// Runs independent chains of the change-point model.
#[derive(Debug)]
pub struct Orchestrator<'m> {
    model: &'m ChangePointModel,
    config: SamplerConfig,
}

impl<'m> Orchestrator<'m> {
    pub fn new(model: &'m ChangePointModel, config: SamplerConfig) -> Result<Self, BcpError> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Runs every chain to completion.
    ///
    /// Chains are independent and share only the read-only model, so they run
    /// on the rayon pool unless `ctx` asks for strict reproducibility. Any
    /// chain failure (timeout and cancellation included) fails the whole run
    /// and all chains, finished or not, are discarded.
    pub fn run(&self, ctx: &ExecutionContext<'_>) -> Result<ChainSet, BcpError> {
        ctx.constraints.validate()?;
        let started_at = Instant::now();
        let chains = self.config.chains;
        let parallel = can_use_parallel(ctx, chains);

        tracing::info!(
            chains,
            draws = self.config.draws,
            tune_steps = self.config.tune_steps,
            seed = self.config.seed,
            n = self.model.cache().n(),
            parallel,
            "sampler run starting"
        );

        let completed = AtomicUsize::new(0);
        let run_one = |chain_id: usize| -> Result<Chain, BcpError> {
            let chain = self.run_chain(chain_id, ctx, started_at)?;
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            ctx.report_progress(done as f32 / chains as f32);
            Ok(chain)
        };

        let (results, thread_count) = if parallel {
            run_parallel(chains, &run_one)
        } else {
            (run_sequential(chains, &run_one), 1)
        };

        let mut completed_chains = Vec::with_capacity(chains);
        for (chain_id, result) in results.into_iter().enumerate() {
            match result {
                Ok(chain) => completed_chains.push(chain),
                Err(err) => {
                    let err = err.in_chain(chain_id);
                    tracing::warn!(
                        chain_id,
                        error = %err,
                        code = err.code(),
                        "sampler run failed"
                    );
                    return Err(err);
                }
            }
        }

        let warnings: Vec<RunWarning> = completed_chains
            .iter()
            .flat_map(|chain| chain.warnings().iter().cloned())
            .collect();

        for chain in &completed_chains {
            ctx.record_scalar("sampler.chain.sweeps", chain.sweeps() as f64);
            for parameter in Parameter::ALL {
                ctx.record_scalar(acceptance_key(parameter), chain.acceptance_rate(parameter));
            }
        }

        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        ctx.record_scalar("sampler.runtime_ms", runtime_ms as f64);
        ctx.report_progress(1.0);

        tracing::info!(
            chains,
            runtime_ms,
            thread_count,
            warnings = warnings.len(),
            "sampler run finished"
        );

        Ok(ChainSet {
            chains: completed_chains,
            warnings,
            runtime_ms,
            thread_count,
        })
    }

    fn run_chain(
        &self,
        chain_id: usize,
        ctx: &ExecutionContext<'_>,
        started_at: Instant,
    ) -> Result<Chain, BcpError> {
        let cache = self.model.cache();
        let prior = self.model.prior();
        let mut init_rng =
            Xoshiro256PlusPlus::seed_from_u64(init_seed(self.config.seed, chain_id));
        let state = initial_state(cache, prior, &mut init_rng);

        ChainSampler::new(
            self.model,
            chain_id,
            chain_seed(self.config.seed, chain_id),
            state,
            initial_scales(cache, prior),
            ChainSettings::from_config(&self.config),
        )?
        .run(ctx, started_at)
    }
}

fn acceptance_key(parameter: Parameter) -> &'static str {
    match parameter {
        Parameter::Tau => "sampler.chain.acceptance.tau",
        Parameter::Mu1 => "sampler.chain.acceptance.mu1",
        Parameter::Mu2 => "sampler.chain.acceptance.mu2",
        Parameter::Sigma => "sampler.chain.acceptance.sigma",
    }
}

#[cfg(feature = "rayon")]
fn can_use_parallel(ctx: &ExecutionContext<'_>, chains: usize) -> bool {
    chains > 1 && ctx.repro_mode != ReproMode::Strict
}

#[cfg(not(feature = "rayon"))]
fn can_use_parallel(_ctx: &ExecutionContext<'_>, _chains: usize) -> bool {
    false
}

#[cfg(feature = "rayon")]
fn run_parallel<F>(chains: usize, run_one: &F) -> (Vec<Result<Chain, BcpError>>, usize)
where
    F: Fn(usize) -> Result<Chain, BcpError> + Sync,
{
    let results = (0..chains).into_par_iter().map(run_one).collect();
    (results, rayon::current_num_threads().min(chains))
}

#[cfg(not(feature = "rayon"))]
fn run_parallel<F>(chains: usize, run_one: &F) -> (Vec<Result<Chain, BcpError>>, usize)
where
    F: Fn(usize) -> Result<Chain, BcpError> + Sync,
{
    (run_sequential(chains, run_one), 1)
}

/// Runs chains in id order, stopping at the first failure.
fn run_sequential<F>(chains: usize, run_one: &F) -> Vec<Result<Chain, BcpError>>
where
    F: Fn(usize) -> Result<Chain, BcpError>,
{
    let mut results = Vec::with_capacity(chains);
    for chain_id in 0..chains {
        let result = run_one(chain_id);
        let failed = result.is_err();
        results.push(result);
        if failed {
            break;
        }
    }
    results
}
