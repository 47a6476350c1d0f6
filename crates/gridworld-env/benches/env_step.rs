use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridworld_env::{ContinuousGridConfig, ContinuousGridEnv, GridAction};

fn bench_transition(c: &mut Criterion) {
    let config = ContinuousGridConfig {
        seed: Some(0),
        ..ContinuousGridConfig::default()
    };
    let mut env = ContinuousGridEnv::new(config).expect("default config is valid");

    c.bench_function("continuous_transition", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % GridAction::COUNT;
            black_box(env.transition(GridAction::ALL[i]))
        });
    });
}

criterion_group!(benches, bench_transition);
criterion_main!(benches);
