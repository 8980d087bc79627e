//! Criterion benchmarks for the transition engine.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use openmaze::prng::Prng;
use openmaze::reward::{CycleRewards, RewardPolicy};
use openmaze::runner::{rollout, RolloutOptions};
use openmaze::{EnvConfig, OpenMaze, Phase};

fn policies() -> Vec<(&'static str, RewardPolicy)> {
    vec![
        ("distance_shaped", RewardPolicy::default()),
        ("no_backtrack", RewardPolicy::no_backtrack()),
        (
            "cycle",
            RewardPolicy::Cycle(CycleRewards {
                cycle_window: 8,
                ..CycleRewards::default()
            }),
        ),
        ("urgency_decay", RewardPolicy::urgency(|n| 1.0 / (1.0 + n as f64))),
    ]
}

fn make_env(policy: RewardPolicy) -> OpenMaze {
    EnvConfig::default()
        .build_with_policy(policy)
        .expect("default layout builds")
}

/// Benchmark masked random steps, resetting whenever an episode ends.
fn bench_step_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_policy");
    group.throughput(Throughput::Elements(1));

    for (name, policy) in policies() {
        group.bench_with_input(BenchmarkId::new("masked", name), &policy, |b, policy| {
            let mut env = make_env(policy.clone());
            let mut rng = Prng::new(42);
            b.iter(|| {
                if env.phase() == Phase::Terminated {
                    env.reset();
                }
                let dir = rng
                    .legal_direction(env.legal_actions())
                    .expect("start region always has a legal move");
                black_box(env.step(dir).expect("step accepted"))
            });
        });
    }

    group.finish();
}

/// Benchmark whole random-policy episodes.
fn bench_rollout(c: &mut Criterion) {
    let mut env = make_env(RewardPolicy::default());
    let mut rng = Prng::new(7);
    let opts = RolloutOptions::default();

    c.bench_function("rollout_distance_shaped", |b| {
        b.iter(|| black_box(rollout(&mut env, &mut rng, &opts, |_, _| Ok(())).expect("rollout")))
    });
}

criterion_group!(benches, bench_step_policies, bench_rollout);
criterion_main!(benches);
