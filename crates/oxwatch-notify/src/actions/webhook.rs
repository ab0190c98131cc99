use crate::utils::{truncate_string, MAX_BODY_LENGTH};
use crate::{Action, ActionError};
use async_trait::async_trait;
use chrono::Utc;
use oxwatch_alert::Alert;
use std::collections::HashMap;
use std::time::Duration;

const ATTEMPTS: u32 = 3;

/// POSTs a JSON document describing the alert to `url`.
///
/// Options: `url` (required), `token` (sent as a bearer token),
/// `timeout_secs` (default 10).
#[derive(Default)]
pub struct WebhookAction {
    url: Option<String>,
    token: Option<String>,
    client: reqwest::Client,
}

impl WebhookAction {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn render_body(alert: &Alert<'_>) -> String {
        serde_json::json!({
            "entity": alert.entity,
            "kind": alert.kind,
            "metric": alert.rule.metric(),
            "operator": alert.rule.op.to_string(),
            "threshold": alert.rule.threshold,
            "cycles": alert.rule.cycle_count,
            "value": alert.rule.last_value(),
            "status": if alert.is_recovery() { "recovered" } else { "firing" },
            "message": alert.message(),
            "timestamp": Utc::now().to_rfc3339(),
        })
        .to_string()
    }
}

#[async_trait]
impl Action for WebhookAction {
    fn name(&self) -> &str {
        "webhook"
    }

    fn setup(&mut self, config: &HashMap<String, String>) -> Result<(), ActionError> {
        let url = config
            .get("url")
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ActionError::InvalidConfig("webhook requires 'url'".into()))?;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ActionError::InvalidConfig(format!(
                "webhook url must be http(s): {url}"
            )));
        }

        let timeout_secs = match config.get("timeout_secs") {
            Some(v) => v.parse::<u64>().map_err(|e| {
                ActionError::InvalidConfig(format!("webhook timeout_secs '{v}': {e}"))
            })?,
            None => 10,
        };

        self.client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        self.url = Some(url.clone());
        self.token = config.get("token").cloned();
        Ok(())
    }

    async fn trigger(&self, alert: &Alert<'_>) -> Result<(), ActionError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| ActionError::NotConfigured("webhook".into()))?;
        let body = Self::render_body(alert);

        let mut last_err = None;
        for attempt in 0..ATTEMPTS {
            let mut request = self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .body(body.clone());
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            match request.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(());
                    }
                    let resp_body = match resp.text().await {
                        Ok(text) => truncate_string(&text, MAX_BODY_LENGTH),
                        Err(e) => format!("[Failed to read response body: {e}]"),
                    };
                    tracing::warn!(
                        attempt = attempt + 1,
                        status = %status,
                        "Webhook returned non-success status, retrying"
                    );
                    last_err = Some(ActionError::Api {
                        service: "webhook".into(),
                        status: status.as_u16(),
                        body: resp_body,
                    });
                }
                Err(e) => {
                    tracing::warn!(attempt = attempt + 1, error = %e, "Webhook send failed, retrying");
                    last_err = Some(e.into());
                }
            }

            if attempt + 1 < ATTEMPTS {
                tokio::time::sleep(Duration::from_millis(100 * 2u64.pow(attempt))).await;
            }
        }

        Err(last_err.unwrap_or_else(|| ActionError::Other("webhook failed".into())))
    }
}
