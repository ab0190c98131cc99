use crate::actions::{log::LogAction, webhook::WebhookAction};
use crate::{Action, ActionError};
use std::collections::HashMap;

pub type ActionFactory = fn() -> Box<dyn Action>;

/// Registry of available action types, used to instantiate actions from
/// configuration.
///
/// # Examples
///
/// ```
/// use oxwatch_notify::plugin::ActionRegistry;
///
/// let registry = ActionRegistry::default();
/// assert!(registry.has_action("log"));
/// assert!(registry.has_action("webhook"));
/// assert!(!registry.has_action("pager"));
/// ```
pub struct ActionRegistry {
    factories: HashMap<String, ActionFactory>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, factory: ActionFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Builds an action of type `kind` and runs its setup.
    pub fn create(
        &self,
        kind: &str,
        config: &HashMap<String, String>,
    ) -> Result<Box<dyn Action>, ActionError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| ActionError::UnknownActionType(kind.to_string()))?;
        let mut action = factory();
        action.setup(config)?;
        Ok(action)
    }

    pub fn has_action(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("log", log_action);
        registry.register("webhook", webhook_action);
        registry
    }
}

fn log_action() -> Box<dyn Action> {
    Box::new(LogAction::default())
}

fn webhook_action() -> Box<dyn Action> {
    Box::new(WebhookAction::default())
}
