//! Engine benchmarks using Criterion.
//!
//! Run with: `cargo bench`
//!
//! Measures candidate enumeration, unification and whole runs over
//! growing inputs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rwvm::{
    engine::{run, EngineConfig},
    env::Env,
    program::Program,
    rule::{Rule, RuleSet},
    scheduler::spawn_pending,
    term::{TermId, TermStore},
    unify::{unify, OccursCheck},
};
use std::sync::Arc;

fn program(rules: Vec<Rule>, value: TermId) -> Program {
    Program::new(Arc::new(RuleSet::from_rules(rules)), value)
}

/// Build a chain of n successors: (s (s ... (s z)))
fn build_chain(n: u32, terms: &TermStore) -> TermId {
    let s = terms.atom(b's');
    let mut result = terms.atom(b'z');
    for _ in 0..n {
        result = terms.seq([s, result]);
    }
    result
}

fn bench_spawn_pending(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn_pending");

    for n in [4, 16, 64] {
        group.bench_with_input(BenchmarkId::new("chain", n), &n, |b, &n| {
            let terms = TermStore::new();
            let v0 = terms.var(0);
            let strip = Rule::new(terms.seq([terms.seq([terms.atom(b's'), v0])]), v0);
            let p = program(vec![strip], build_chain(n, &terms));

            b.iter(|| spawn_pending(black_box(&p), black_box(&terms)))
        });
    }

    group.finish();
}

fn bench_unify(c: &mut Criterion) {
    let mut group = c.benchmark_group("unify");

    for n in [4, 16, 64] {
        group.bench_with_input(BenchmarkId::new("chain", n), &n, |b, &n| {
            let terms = TermStore::new();
            let ground = build_chain(n, &terms);
            // Same chain with its innermost atom replaced by a variable.
            let mut open = terms.var(0);
            for _ in 0..n {
                open = terms.seq([terms.atom(b's'), open]);
            }

            b.iter(|| {
                unify(
                    black_box(open),
                    black_box(ground),
                    &Env::new(),
                    &terms,
                    OccursCheck::Enforce,
                )
            })
        });
    }

    group.finish();
}

/// Full run of the successor-stripping rule. Every order of stripping is
/// a separate derivation, so the work grows factorially.
fn bench_run_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_chain");

    for n in [2, 4, 6] {
        group.bench_with_input(BenchmarkId::new("n", n), &n, |b, &n| {
            let terms = TermStore::new();
            let v0 = terms.var(0);
            let strip = Rule::new(terms.seq([terms.seq([terms.atom(b's'), v0])]), v0);
            let value = build_chain(n, &terms);

            b.iter(|| {
                run(
                    program(vec![strip], black_box(value)),
                    &terms,
                    EngineConfig::default(),
                )
            })
        });
    }

    group.finish();
}

/// Budgeted run of a self-loop, measuring raw stepping throughput.
fn bench_budgeted_loop(c: &mut Criterion) {
    let terms = TermStore::new();
    let a = terms.atom(b'a');
    let config = EngineConfig::default().with_step_budget(1_000);

    c.bench_function("self_loop_1000_steps", |b| {
        b.iter(|| run(program(vec![Rule::new(a, a)], black_box(a)), &terms, config))
    });
}

criterion_group!(
    benches,
    bench_spawn_pending,
    bench_unify,
    bench_run_chain,
    bench_budgeted_loop
);
criterion_main!(benches);
