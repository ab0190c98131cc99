//! Threshold rules with hysteresis.
//!
//! A [`rule::Rule`] compares the latest sample of one metric against a
//! threshold once per cycle and only trips after the comparison has held
//! for its configured number of consecutive cycles. Rules that trip or
//! recover are handed to the notifier as an [`Alert`].

pub mod engine;
pub mod rule;

#[cfg(test)]
mod tests;

use rule::{Rule, RuleStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Host,
    Service,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Host => write!(f, "host"),
            EntityKind::Service => write!(f, "service"),
        }
    }
}

/// A rule that just tripped or recovered, paired with the entity owning it.
#[derive(Debug, Clone, Copy)]
pub struct Alert<'a> {
    pub entity: &'a str,
    pub kind: EntityKind,
    pub rule: &'a Rule,
}

impl<'a> Alert<'a> {
    pub fn new(entity: &'a str, kind: EntityKind, rule: &'a Rule) -> Self {
        Self { entity, kind, rule }
    }

    pub fn is_recovery(&self) -> bool {
        self.rule.status() == RuleStatus::Recovered
    }

    /// One-line human readable summary.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxwatch_alert::rule::{Operator, Rule};
    /// use oxwatch_alert::{Alert, EntityKind};
    ///
    /// let mut rule = Rule::new("memory", "", Operator::GreaterThan, 90, 1).unwrap();
    /// rule.evaluate(Some(95.0));
    /// let alert = Alert::new("web-01", EntityKind::Host, &rule);
    /// assert_eq!(
    ///     alert.message(),
    ///     "web-01: memory is above 90 (currently 95.0) for 1 cycle(s)"
    /// );
    /// ```
    pub fn message(&self) -> String {
        let value = self
            .rule
            .last_value()
            .map(|v| format!(" (currently {v:.1})"))
            .unwrap_or_default();
        if self.is_recovery() {
            format!(
                "{}: {} has recovered{value}",
                self.entity,
                self.rule.metric()
            )
        } else {
            format!(
                "{}: {} is {} {}{value} for {} cycle(s)",
                self.entity,
                self.rule.metric(),
                self.rule.op.describe(),
                self.rule.threshold,
                self.rule.cycle_count,
            )
        }
    }
}
