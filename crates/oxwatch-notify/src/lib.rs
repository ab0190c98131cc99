//! Alert delivery.
//!
//! Rules name the actions they trigger. Each configured action is built
//! by the [`plugin::ActionRegistry`], set up once, and invoked in order by
//! the [`manager::Dispatcher`] for every alert of a cycle. Built-in
//! actions are `log` and `webhook`.

pub mod actions;
pub mod error;
pub mod manager;
pub mod plugin;
pub mod utils;

#[cfg(test)]
mod tests;

pub use error::ActionError;

use async_trait::async_trait;
use oxwatch_alert::Alert;
use std::collections::HashMap;

/// Something to do when a rule trips or recovers.
#[async_trait]
pub trait Action: Send + Sync {
    /// Action type name (e.g. `"webhook"`).
    fn name(&self) -> &str;

    /// Applies configuration. Called once before the first trigger.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidConfig`] if a required option is
    /// missing or unusable.
    fn setup(&mut self, config: &HashMap<String, String>) -> Result<(), ActionError>;

    /// Delivers one alert.
    async fn trigger(&self, alert: &Alert<'_>) -> Result<(), ActionError>;
}
