// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use bcp_bench::step_series;
use bcp_core::{Constraints, ExecutionContext, ReproMode};
use bcp_model::{ChangePointModel, PriorConfig};
use bcp_sampler::{
    ChainSampler, ChainSettings, Orchestrator, SamplerConfig, initial_scales, initial_state,
};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::time::Instant;

fn bench_config() -> SamplerConfig {
    SamplerConfig {
        chains: 4,
        draws: 1_000,
        tune_steps: 500,
        seed: 11,
        ..SamplerConfig::default()
    }
}

fn benchmark_single_chain(c: &mut Criterion) {
    let series = step_series(2_000, 1_200).expect("benchmark series should build");
    let config = bench_config();
    let model = ChangePointModel::new(&series, config.prior(), ReproMode::Balanced)
        .expect("benchmark model should build");
    let settings = ChainSettings::from_config(&config);
    let constraints = Constraints::default();
    let ctx = ExecutionContext::new(&constraints);

    c.bench_function("chain_n2e3_sweeps1500", |b| {
        b.iter(|| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
            let start = initial_state(model.cache(), model.prior(), &mut rng);
            let scales = initial_scales(model.cache(), model.prior());
            ChainSampler::new(&model, 0, 3, start, scales, settings)
                .expect("benchmark chain should build")
                .run(black_box(&ctx), Instant::now())
                .expect("benchmark chain should run")
        })
    });
}

fn benchmark_orchestrator(c: &mut Criterion) {
    let series = step_series(2_000, 1_200).expect("benchmark series should build");
    let config = bench_config();
    let model = ChangePointModel::new(&series, config.prior(), ReproMode::Balanced)
        .expect("benchmark model should build");
    let orchestrator =
        Orchestrator::new(&model, config).expect("benchmark config should be valid");
    let constraints = Constraints::default();

    let mut group = c.benchmark_group("orchestrator_n2e3_chains4");
    for (name, mode) in [("parallel", ReproMode::Balanced), ("sequential", ReproMode::Strict)] {
        let ctx = ExecutionContext::new(&constraints).with_repro_mode(mode);
        group.bench_function(name, |b| {
            b.iter(|| {
                orchestrator
                    .run(black_box(&ctx))
                    .expect("benchmark run should succeed")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_single_chain, benchmark_orchestrator);
criterion_main!(benches);
