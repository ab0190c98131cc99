use crate::{Action, ActionError};
use async_trait::async_trait;
use oxwatch_alert::Alert;
use std::collections::HashMap;
use tracing::Level;

/// Writes each alert to the agent log.
pub struct LogAction {
    level: Level,
}

impl Default for LogAction {
    fn default() -> Self {
        Self { level: Level::WARN }
    }
}

impl LogAction {
    pub fn level(&self) -> Level {
        self.level
    }
}

#[async_trait]
impl Action for LogAction {
    fn name(&self) -> &str {
        "log"
    }

    fn setup(&mut self, config: &HashMap<String, String>) -> Result<(), ActionError> {
        if let Some(level) = config.get("level") {
            self.level = match level.to_lowercase().as_str() {
                "info" => Level::INFO,
                "warn" | "warning" => Level::WARN,
                "error" => Level::ERROR,
                other => {
                    return Err(ActionError::InvalidConfig(format!(
                        "unknown log level '{other}'"
                    )))
                }
            };
        }
        Ok(())
    }

    async fn trigger(&self, alert: &Alert<'_>) -> Result<(), ActionError> {
        let message = alert.message();
        let entity = alert.entity;
        let status = alert.rule.status();
        match self.level {
            Level::ERROR => tracing::error!(entity, %status, "{message}"),
            Level::INFO => tracing::info!(entity, %status, "{message}"),
            _ => tracing::warn!(entity, %status, "{message}"),
        }
        Ok(())
    }
}
