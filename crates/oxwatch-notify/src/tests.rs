use crate::actions::log::LogAction;
use crate::actions::webhook::WebhookAction;
use crate::manager::{DispatchReport, Dispatcher};
use crate::plugin::ActionRegistry;
use crate::utils::{redact_options, truncate_string};
use crate::{Action, ActionError};
use async_trait::async_trait;
use oxwatch_alert::rule::{Operator, Rule};
use oxwatch_alert::{Alert, EntityKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

struct Recording {
    label: &'static str,
    fail: bool,
    log: Log,
}

#[async_trait]
impl Action for Recording {
    fn name(&self) -> &str {
        "recording"
    }

    fn setup(&mut self, _config: &HashMap<String, String>) -> Result<(), ActionError> {
        Ok(())
    }

    async fn trigger(&self, alert: &Alert<'_>) -> Result<(), ActionError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}:{}", self.label, alert.entity, alert.rule.status()));
        if self.fail {
            return Err(ActionError::Other("delivery failed".into()));
        }
        Ok(())
    }
}

fn recording(label: &'static str, fail: bool, log: &Log) -> Box<dyn Action> {
    Box::new(Recording {
        label,
        fail,
        log: log.clone(),
    })
}

fn tripped_rule(actions: &[&str]) -> Rule {
    let mut rule = Rule::new("nginx", "requests", Operator::GreaterThan, 100, 1)
        .unwrap()
        .with_actions(actions.iter().map(|a| a.to_string()).collect());
    rule.evaluate(Some(500.0));
    rule
}

#[tokio::test]
async fn dispatch_runs_actions_in_declared_order() {
    let log = Log::default();
    let mut dispatcher = Dispatcher::new();
    dispatcher.insert("first", recording("first", false, &log));
    dispatcher.insert("second", recording("second", false, &log));

    let rule = tripped_rule(&["second", "first"]);
    let alerts = [Alert::new("nginx", EntityKind::Service, &rule)];
    let report = dispatcher.dispatch(&alerts).await;

    assert_eq!(
        report,
        DispatchReport {
            triggered: 2,
            failed: 0,
            skipped: 0
        }
    );
    assert_eq!(
        *log.lock().unwrap(),
        vec!["second:nginx:tripped", "first:nginx:tripped"]
    );
}

#[tokio::test]
async fn failing_action_does_not_stop_others() {
    let log = Log::default();
    let mut dispatcher = Dispatcher::new();
    dispatcher.insert("broken", recording("broken", true, &log));
    dispatcher.insert("ok", recording("ok", false, &log));

    let first = tripped_rule(&["broken", "ok"]);
    let second = tripped_rule(&["ok"]);
    let alerts = [
        Alert::new("nginx", EntityKind::Service, &first),
        Alert::new("web-01", EntityKind::Host, &second),
    ];
    let report = dispatcher.dispatch(&alerts).await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.triggered, 2);
    assert_eq!(log.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn failed_setup_disables_action() {
    let registry = ActionRegistry::default();
    let mut dispatcher = Dispatcher::new();

    assert!(!dispatcher.configure(&registry, "ops-hook", "webhook", &HashMap::new()));
    assert!(dispatcher.is_disabled("ops-hook"));
    assert!(!dispatcher.is_enabled("ops-hook"));

    let rule = tripped_rule(&["ops-hook", "missing"]);
    let alerts = [Alert::new("nginx", EntityKind::Service, &rule)];
    let report = dispatcher.dispatch(&alerts).await;
    assert_eq!(report.skipped, 2);
    assert_eq!(report.triggered, 0);
}

#[tokio::test]
async fn log_action_triggers() {
    let registry = ActionRegistry::default();
    let mut dispatcher = Dispatcher::new();
    let options = HashMap::from([("level".to_string(), "error".to_string())]);
    assert!(dispatcher.configure(&registry, "log", "log", &options));

    let rule = tripped_rule(&["log"]);
    let alerts = [Alert::new("nginx", EntityKind::Service, &rule)];
    assert_eq!(dispatcher.dispatch(&alerts).await.triggered, 1);
}

#[test]
fn registry_rejects_unknown_type() {
    let registry = ActionRegistry::default();
    assert!(matches!(
        registry.create("pager", &HashMap::new()),
        Err(ActionError::UnknownActionType(_))
    ));
}

#[test]
fn log_action_rejects_unknown_level() {
    let mut action = LogAction::default();
    let options = HashMap::from([("level".to_string(), "loud".to_string())]);
    assert!(matches!(
        action.setup(&options),
        Err(ActionError::InvalidConfig(_))
    ));
}

#[test]
fn webhook_setup_validates_url() {
    let mut action = WebhookAction::default();
    let bad = HashMap::from([("url".to_string(), "ftp://example.com".to_string())]);
    assert!(action.setup(&bad).is_err());

    let good = HashMap::from([
        ("url".to_string(), "https://hooks.example.com/alert".to_string()),
        ("timeout_secs".to_string(), "3".to_string()),
    ]);
    action.setup(&good).unwrap();
    assert_eq!(action.url(), Some("https://hooks.example.com/alert"));
}

#[tokio::test]
async fn webhook_without_setup_is_not_configured() {
    let action = WebhookAction::default();
    let rule = tripped_rule(&[]);
    let alert = Alert::new("nginx", EntityKind::Service, &rule);
    assert!(matches!(
        action.trigger(&alert).await,
        Err(ActionError::NotConfigured(_))
    ));
}

#[test]
fn webhook_body_describes_alert() {
    let mut rule = tripped_rule(&[]);
    rule.evaluate(Some(5.0));
    let alert = Alert::new("nginx", EntityKind::Service, &rule);

    let body: serde_json::Value = serde_json::from_str(&WebhookAction::render_body(&alert)).unwrap();
    assert_eq!(body["entity"], "nginx");
    assert_eq!(body["kind"], "service");
    assert_eq!(body["metric"], "nginx(requests)");
    assert_eq!(body["status"], "recovered");
    assert_eq!(body["threshold"], 100);
}

#[test]
fn redacts_secret_options() {
    let options = HashMap::from([
        ("url".to_string(), "https://x".to_string()),
        ("token".to_string(), "abc".to_string()),
    ]);
    let redacted = redact_options(&options);
    assert_eq!(redacted["token"], "***");
    assert_eq!(redacted["url"], "https://x");
}

#[test]
fn truncate_respects_char_boundaries() {
    assert_eq!(truncate_string("short", 10), "short");
    assert_eq!(truncate_string("ééé", 3), "é... [truncated]");
}
