use rwvm::engine::{run, Engine, EngineConfig, RunStatus};
use rwvm::error::EngineError;
use rwvm::program::Program;
use rwvm::rule::{Rule, RuleSet};
use rwvm::stepper::StepOutcome;
use rwvm::term::{format_term, TermStore};
use std::sync::Arc;

fn program(rules: Vec<Rule>, value: rwvm::term::TermId) -> Program {
    Program::new(Arc::new(RuleSet::from_rules(rules)), value)
}

fn rendered(results: &[rwvm::program::ProgramResult], terms: &TermStore) -> Vec<String> {
    results.iter().map(|r| r.format(terms).unwrap()).collect()
}

#[test]
fn single_rule_a_to_b() {
    let terms = TermStore::new();
    let rules = vec![Rule::new(terms.atom(b'a'), terms.atom(b'b'))];

    let outcome = run(program(rules, terms.atom(b'a')), &terms, EngineConfig::default()).unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(rendered(&outcome.results, &terms), vec!["b via [0]"]);
}

#[test]
fn no_rules_is_identity() {
    let terms = TermStore::new();
    let value = terms.bytes(b"hello");

    let outcome = run(program(vec![], value), &terms, EngineConfig::default()).unwrap();
    assert_eq!(rendered(&outcome.results, &terms), vec!["(h e l l o) via []"]);
}

#[test]
fn self_loop_with_budget() {
    let terms = TermStore::new();
    let a = terms.atom(b'a');

    let outcome = run(
        program(vec![Rule::new(a, a)], a),
        &terms,
        EngineConfig::default().with_step_budget(5),
    )
    .unwrap();
    assert_eq!(outcome.status, RunStatus::BudgetExhausted { steps: 5 });
    assert!(outcome.results.is_empty());
}

#[test]
fn alternative_patterns_share_one_rule_index() {
    let terms = TermStore::new();
    let (a, b, c) = (terms.atom(b'a'), terms.atom(b'b'), terms.atom(b'c'));
    let rule = Rule::with_alternatives([a, b], c, &terms);

    let outcome = run(
        program(vec![rule], terms.seq([a, b])),
        &terms,
        EngineConfig::default(),
    )
    .unwrap();
    assert_eq!(
        rendered(&outcome.results, &terms),
        vec!["(c c) via [0, 0]", "(c c) via [0, 0]"]
    );
}

#[test]
fn bindings_carry_into_the_rewrite() {
    let terms = TermStore::new();
    let (p, q, x, y) = (
        terms.atom(b'p'),
        terms.atom(b'q'),
        terms.atom(b'x'),
        terms.atom(b'y'),
    );
    let (v0, v1) = (terms.var(0), terms.var(1));
    // ((p $0 $1)) -> (q $1 $0)
    let swap = Rule::new(terms.seq([terms.seq([p, v0, v1])]), terms.seq([q, v1, v0]));

    let outcome = run(
        program(vec![swap], terms.seq([p, x, y])),
        &terms,
        EngineConfig::default(),
    )
    .unwrap();
    assert_eq!(rendered(&outcome.results, &terms), vec!["(q y x) via [0]"]);
}

#[test]
fn nested_rewrites_record_every_rule_used() {
    let terms = TermStore::new();
    let (s, z) = (terms.atom(b's'), terms.atom(b'z'));
    let v0 = terms.var(0);
    // ((s $0)) -> $0 strips one successor; z -> 0 ends the count.
    let rules = vec![
        Rule::new(terms.seq([terms.seq([s, v0])]), v0),
        Rule::new(z, terms.atom(b'0')),
    ];
    let two = terms.seq([s, terms.seq([s, z])]);

    let outcome = run(program(rules, two), &terms, EngineConfig::default()).unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
    assert!(!outcome.results.is_empty());
    for result in &outcome.results {
        assert_eq!(format_term(result.value(), &terms).unwrap(), "0");
        let mut path = result.path.to_vec();
        path.sort_unstable();
        assert_eq!(path, vec![0, 0, 1]);
    }
}

#[test]
fn engine_can_be_driven_one_step_at_a_time() {
    let terms = TermStore::new();
    let rules = vec![Rule::new(terms.atom(b'a'), terms.atom(b'b'))];
    let mut engine =
        Engine::new(program(rules, terms.atom(b'a')), &terms, EngineConfig::default()).unwrap();

    let mut outcomes = Vec::new();
    while !engine.is_done() {
        outcomes.push(engine.step().unwrap());
    }
    assert!(matches!(outcomes[0], StepOutcome::Pushed));
    assert!(matches!(outcomes.last(), Some(StepOutcome::Folded { results: 1 })));
    assert_eq!(engine.steps(), outcomes.len() as u64);
    assert_eq!(engine.metrics().steps, engine.steps());
    assert_eq!(rendered(engine.results(), &terms), vec!["b via [0]"]);
}

#[test]
fn foreign_term_ids_abort_the_run() {
    let terms = TermStore::new();
    let foreign = {
        let other = TermStore::new();
        other.bytes(b"some other store");
        other.atom(b'!')
    };

    let err = run(program(vec![], foreign), &terms, EngineConfig::default()).unwrap_err();
    assert_eq!(err, EngineError::UnknownTerm(foreign));
    assert!(err.to_string().contains("unknown term id"));
}
