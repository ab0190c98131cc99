use crate::engine::{alerts_for, evaluate_rules};
use crate::rule::{Operator, Rule, RuleError, RuleStatus};
use crate::EntityKind;
use oxwatch_common::history::{CycleBatch, History};
use oxwatch_common::types::MetricKey;

fn gt(threshold: i64, cycles: u8) -> Rule {
    Rule::new("Active_connections", "", Operator::GreaterThan, threshold, cycles).unwrap()
}

fn run(rule: &mut Rule, samples: &[Option<f64>]) -> Vec<RuleStatus> {
    samples.iter().map(|s| rule.evaluate(*s)).collect()
}

#[test]
fn trips_after_required_cycles_then_recovers() {
    let mut rule = gt(100, 2);

    assert_eq!(rule.evaluate(Some(150.0)), RuleStatus::Ok);
    assert_eq!(rule.consecutive(), 1);

    assert_eq!(rule.evaluate(Some(150.0)), RuleStatus::Tripped);
    assert_eq!(rule.consecutive(), 2);

    assert_eq!(rule.evaluate(Some(40.0)), RuleStatus::Recovered);
    assert_eq!(rule.consecutive(), 0);
    assert!(!rule.is_firing());
}

#[test]
fn single_cycle_rule_trips_immediately() {
    let mut rule = Rule::new("swap", "", Operator::GreaterThan, 20, 1).unwrap();
    assert_eq!(rule.evaluate(Some(21.0)), RuleStatus::Tripped);
}

#[test]
fn intervening_good_cycle_resets_counter() {
    let mut rule = gt(100, 3);
    let statuses = run(
        &mut rule,
        &[Some(150.0), Some(150.0), Some(50.0), Some(150.0), Some(150.0), Some(150.0)],
    );
    assert_eq!(
        statuses,
        vec![
            RuleStatus::Ok,
            RuleStatus::Ok,
            RuleStatus::Ok,
            RuleStatus::Ok,
            RuleStatus::Ok,
            RuleStatus::Tripped,
        ]
    );
}

#[test]
fn sustained_violation_does_not_refire() {
    let mut rule = gt(100, 2);
    let statuses = run(&mut rule, &[Some(150.0); 5]);
    assert_eq!(
        statuses,
        vec![
            RuleStatus::Ok,
            RuleStatus::Tripped,
            RuleStatus::Unchanged,
            RuleStatus::Unchanged,
            RuleStatus::Unchanged,
        ]
    );
    assert_eq!(statuses.iter().filter(|s| s.is_notable()).count(), 1);
}

#[test]
fn steady_ok_becomes_unchanged() {
    let mut rule = gt(100, 2);
    let statuses = run(&mut rule, &[Some(10.0), Some(20.0), Some(30.0)]);
    assert_eq!(
        statuses,
        vec![RuleStatus::Ok, RuleStatus::Unchanged, RuleStatus::Unchanged]
    );
}

#[test]
fn equal_to_threshold_is_not_a_violation() {
    let mut above = gt(100, 1);
    assert_eq!(above.evaluate(Some(100.0)), RuleStatus::Ok);
    assert_eq!(above.consecutive(), 0);

    let mut below = Rule::new("memory", "available", Operator::LessThan, 100, 1).unwrap();
    assert_eq!(below.evaluate(Some(100.0)), RuleStatus::Ok);
    assert_eq!(below.evaluate(Some(99.0)), RuleStatus::Tripped);
}

#[test]
fn missing_sample_is_undetermined_and_keeps_alert_state() {
    let mut rule = gt(100, 2);
    let statuses = run(
        &mut rule,
        &[None, Some(150.0), Some(150.0), None, Some(150.0), Some(40.0)],
    );
    assert_eq!(
        statuses,
        vec![
            RuleStatus::Undetermined,
            RuleStatus::Ok,
            RuleStatus::Tripped,
            RuleStatus::Undetermined,
            RuleStatus::Unchanged,
            RuleStatus::Recovered,
        ]
    );
}

#[test]
fn counter_never_exceeds_cycles_since_reset() {
    let mut rule = gt(0, 3);
    let samples = [5.0, 5.0, -1.0, 5.0, 5.0, 5.0, 5.0, -3.0, 5.0];
    let mut since_reset = 0u32;
    for sample in samples {
        rule.evaluate(Some(sample));
        if sample > 0.0 {
            since_reset += 1;
        } else {
            since_reset = 0;
        }
        assert!(rule.consecutive() <= since_reset);
    }
}

#[test]
fn zero_cycle_count_is_rejected() {
    let err = Rule::new("nginx", "requests", Operator::GreaterThan, 1, 0).unwrap_err();
    assert_eq!(err, RuleError::ZeroCycles("nginx(requests)".into()));
}

#[test]
fn operator_parsing() {
    assert_eq!("<".parse::<Operator>(), Ok(Operator::LessThan));
    assert_eq!("gt".parse::<Operator>(), Ok(Operator::GreaterThan));
    assert_eq!("greater_than".parse::<Operator>(), Ok(Operator::GreaterThan));
    assert!("=".parse::<Operator>().is_err());
}

#[test]
fn rule_metric_display() {
    let rule = Rule::new("nginx", "requests", Operator::GreaterThan, 1, 1).unwrap();
    assert_eq!(rule.metric(), "nginx(requests)");
    assert_eq!(gt(1, 1).metric(), "Active_connections");
}

fn commit(history: &mut History, value: Option<f64>) {
    let mut batch = CycleBatch::new();
    if let Some(value) = value {
        batch.record(MetricKey::new("Active_connections", ""), value);
    }
    history.commit(batch);
}

#[test]
fn engine_reports_notable_rules_from_history() {
    let mut history = History::default();
    let mut rules = vec![
        gt(100, 2).with_actions(vec!["log".into()]),
        Rule::new("Active_connections", "", Operator::LessThan, 1, 1).unwrap(),
    ];

    let mut fired = Vec::new();
    for sample in [150.0, 150.0, 40.0] {
        commit(&mut history, Some(sample));
        fired.push(evaluate_rules("nginx", &mut rules, &history));
    }

    assert_eq!(fired, vec![vec![], vec![0], vec![0]]);

    let alerts = alerts_for("nginx", EntityKind::Service, &rules, &fired[2]);
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].is_recovery());
    assert_eq!(alerts[0].entity, "nginx");
    assert_eq!(alerts[0].rule.actions, vec!["log".to_string()]);
}

#[test]
fn engine_marks_rules_undetermined_without_samples() {
    let mut history = History::default();
    let mut rules = vec![gt(100, 1)];

    commit(&mut history, None);
    assert!(evaluate_rules("nginx", &mut rules, &history).is_empty());
    assert_eq!(rules[0].status(), RuleStatus::Undetermined);
}
