use oxwatch_common::types::MetricKey;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("Rule: cycle count for {0} must be at least 1")]
    ZeroCycles(String),

    #[error("Rule: unknown compare operator '{0}'")]
    UnknownOperator(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    LessThan,
    GreaterThan,
}

impl FromStr for Operator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" | "lt" | "less_than" => Ok(Self::LessThan),
            ">" | "gt" | "greater_than" => Ok(Self::GreaterThan),
            _ => Err(RuleError::UnknownOperator(s.to_string())),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LessThan => write!(f, "<"),
            Self::GreaterThan => write!(f, ">"),
        }
    }
}

impl Operator {
    /// Strict comparison; a sample equal to the threshold never holds.
    pub fn check(self, value: f64, threshold: i64) -> bool {
        let threshold = threshold as f64;
        match self {
            Self::LessThan => value < threshold,
            Self::GreaterThan => value > threshold,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::LessThan => "below",
            Self::GreaterThan => "above",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    /// No sample this cycle, or nothing evaluated yet.
    #[default]
    Undetermined,
    /// Not tripped; possibly still counting violations.
    Ok,
    /// Tripped this cycle.
    Tripped,
    /// Stopped holding this cycle after having tripped.
    Recovered,
    /// Same outcome as the previous cycle; nothing to report.
    Unchanged,
}

impl RuleStatus {
    /// Whether this status should be reported to actions.
    pub fn is_notable(self) -> bool {
        matches!(self, RuleStatus::Tripped | RuleStatus::Recovered)
    }
}

impl std::fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleStatus::Undetermined => write!(f, "undetermined"),
            RuleStatus::Ok => write!(f, "ok"),
            RuleStatus::Tripped => write!(f, "tripped"),
            RuleStatus::Recovered => write!(f, "recovered"),
            RuleStatus::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// A threshold check bound to one metric of one entity.
#[derive(Debug, Clone)]
pub struct Rule {
    pub family: String,
    /// Empty when the family itself is the scalar.
    pub name: String,
    pub op: Operator,
    pub threshold: i64,
    /// Consecutive violating cycles required before tripping.
    pub cycle_count: u8,
    /// Names of the actions to trigger, in order.
    pub actions: Vec<String>,
    status: RuleStatus,
    consecutive: u32,
    /// Tripped and not yet recovered.
    firing: bool,
    last_held: Option<bool>,
    last_value: Option<f64>,
}

impl Rule {
    pub fn new(
        family: impl Into<String>,
        name: impl Into<String>,
        op: Operator,
        threshold: i64,
        cycle_count: u8,
    ) -> Result<Self, RuleError> {
        let family = family.into();
        let name = name.into();
        if cycle_count == 0 {
            return Err(RuleError::ZeroCycles(MetricKey::new(family, name).to_string()));
        }
        Ok(Self {
            family,
            name,
            op,
            threshold,
            cycle_count,
            actions: Vec::new(),
            status: RuleStatus::Undetermined,
            consecutive: 0,
            firing: false,
            last_held: None,
            last_value: None,
        })
    }

    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.actions = actions;
        self
    }

    pub fn key(&self) -> MetricKey {
        MetricKey::new(self.family.as_str(), self.name.as_str())
    }

    /// `family(name)`, or just `family` for a family scalar.
    pub fn metric(&self) -> String {
        self.key().to_string()
    }

    pub fn status(&self) -> RuleStatus {
        self.status
    }

    /// Consecutive cycles the comparison has held.
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn is_firing(&self) -> bool {
        self.firing
    }

    pub fn last_value(&self) -> Option<f64> {
        self.last_value
    }

    /// Advances the rule by one cycle given that cycle's sample and returns
    /// the new status.
    ///
    /// A missing sample sets `Undetermined` without touching the
    /// violation counter or the firing state, so a gap in data neither
    /// re-fires nor silently clears an active alert.
    pub fn evaluate(&mut self, sample: Option<f64>) -> RuleStatus {
        let Some(value) = sample else {
            self.status = RuleStatus::Undetermined;
            self.last_held = None;
            self.last_value = None;
            return self.status;
        };

        let previous = self.status;
        let held = self.op.check(value, self.threshold);
        let stable = self.last_held == Some(held) && previous != RuleStatus::Undetermined;

        if held {
            self.consecutive = self.consecutive.saturating_add(1);
        } else {
            self.consecutive = 0;
        }

        self.status = if held {
            if self.firing {
                RuleStatus::Unchanged
            } else if self.consecutive >= u32::from(self.cycle_count) {
                self.firing = true;
                RuleStatus::Tripped
            } else {
                RuleStatus::Ok
            }
        } else if self.firing {
            self.firing = false;
            RuleStatus::Recovered
        } else if stable {
            RuleStatus::Unchanged
        } else {
            RuleStatus::Ok
        };

        self.last_held = Some(held);
        self.last_value = Some(value);
        self.status
    }
}
