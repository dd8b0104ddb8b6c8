use super::*;

#[test]
fn metrics_default_is_zero() {
    let metrics = StepMetrics::default();
    assert_eq!(metrics.steps, 0);
    assert_eq!(metrics.max_depth, 0);
    assert_eq!(metrics, StepMetrics::new());
}

#[test]
fn metrics_success_rate() {
    let mut metrics = StepMetrics::default();

    // No attempts = 100% success
    assert_eq!(metrics.unification_success_rate(), 1.0);

    metrics.record_unification();
    metrics.record_unification();
    metrics.record_unification();
    metrics.record_unification_failure();
    assert!((metrics.unification_success_rate() - 0.75).abs() < 0.001);
}

#[test]
fn push_tracks_max_depth() {
    let mut metrics = StepMetrics::default();
    metrics.record_push(1);
    metrics.record_push(4);
    metrics.record_pop();
    metrics.record_push(2);

    assert_eq!(metrics.frames_pushed, 3);
    assert_eq!(metrics.frames_popped, 1);
    assert_eq!(metrics.max_depth, 4);
}

#[test]
fn record_spawned_accumulates() {
    let mut metrics = StepMetrics::default();
    metrics.record_spawned(3);
    metrics.record_spawned(0);
    metrics.record_spawned(5);
    assert_eq!(metrics.candidates_spawned, 8);
}

#[test]
fn metrics_display() {
    let metrics = StepMetrics {
        steps: 100,
        unifications: 50,
        unification_failures: 10,
        ..Default::default()
    };

    let output = format!("{}", metrics);
    assert!(output.contains("Steps:"));
    assert!(output.contains("100"));
    assert!(output.contains("Unifications:"));
}
