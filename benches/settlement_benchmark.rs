use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ledger_settle::allocation::{AllocationEngine, NullSink};
use ledger_settle::pipeline::{Pipeline, PipelineConfig};
use ledger_settle::settlement::StrategyKind;
use ledger_settle::simulation::{generate_random_ledger, RandomLedgerConfig};

fn config(participants: usize, expenses: usize) -> RandomLedgerConfig {
    RandomLedgerConfig {
        participants,
        expenses,
        seed: Some(2024),
        ..Default::default()
    }
}

fn bench_allocation(c: &mut Criterion) {
    let ledger = generate_random_ledger(&config(50, 500)).unwrap();
    let engine = AllocationEngine::default();

    c.bench_function("allocate_50_participants", |b| {
        b.iter(|| engine.allocate_ledger(black_box(&ledger), &mut NullSink))
    });
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    for participants in [10usize, 50, 200] {
        let ledger = generate_random_ledger(&config(participants, participants * 5)).unwrap();
        for strategy in StrategyKind::ALL {
            let pipeline = Pipeline::new(PipelineConfig {
                strategy,
                ..Default::default()
            });
            group.bench_with_input(
                BenchmarkId::new(strategy.to_string(), participants),
                &ledger,
                |b, ledger| b.iter(|| pipeline.run(black_box(ledger))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_allocation, bench_strategies);
criterion_main!(benches);
