use crate::plugin::ActionRegistry;
use crate::utils::redact_options;
use crate::Action;
use oxwatch_alert::Alert;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Outcome counts of one [`Dispatcher::dispatch`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub triggered: usize,
    pub failed: usize,
    /// Disabled or unknown actions.
    pub skipped: usize,
}

/// Runs the actions named by each alert's rule.
#[derive(Default)]
pub struct Dispatcher {
    actions: HashMap<String, Arc<dyn Action>>,
    disabled: HashSet<String>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates action `name` of type `kind`. If setup fails the name is
    /// disabled for the lifetime of the dispatcher.
    pub fn configure(
        &mut self,
        registry: &ActionRegistry,
        name: &str,
        kind: &str,
        options: &HashMap<String, String>,
    ) -> bool {
        match registry.create(kind, options) {
            Ok(action) => {
                tracing::info!(action = name, kind, options = ?redact_options(options), "Action configured");
                self.insert(name, action);
                true
            }
            Err(e) => {
                tracing::error!(action = name, kind, error = %e, "Action setup failed, disabling");
                self.actions.remove(name);
                self.disabled.insert(name.to_string());
                false
            }
        }
    }

    pub fn insert(&mut self, name: &str, action: Box<dyn Action>) {
        self.disabled.remove(name);
        self.actions.insert(name.to_string(), Arc::from(action));
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.contains(name)
    }

    /// Triggers every action of every alert in declared order. Failures are
    /// logged and do not stop the remaining actions.
    pub async fn dispatch(&self, alerts: &[Alert<'_>]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for alert in alerts {
            tracing::info!(
                entity = alert.entity,
                kind = %alert.kind,
                metric = %alert.rule.metric(),
                status = %alert.rule.status(),
                "{}",
                alert.message()
            );

            for name in &alert.rule.actions {
                let Some(action) = self.actions.get(name) else {
                    if self.disabled.contains(name) {
                        tracing::debug!(action = %name, "Action disabled, skipping");
                    } else {
                        tracing::warn!(action = %name, "Unknown action, skipping");
                    }
                    report.skipped += 1;
                    continue;
                };

                match action.trigger(alert).await {
                    Ok(()) => report.triggered += 1,
                    Err(e) => {
                        tracing::error!(
                            action = %name,
                            entity = alert.entity,
                            error = %e,
                            "Action failed"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        report
    }
}
