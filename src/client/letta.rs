use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use crate::config::credentials::redact_credentials;
use crate::errors::EngineError;
use super::provider::ActivationClient;
use super::types::ActivationResult;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://app.letta.com";

pub struct LettaClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LettaClient {
    pub fn new(api_key: &str, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url,
        }
    }

    pub fn messages_url(&self, agent_id: &str) -> String {
        format!("{}/v1/agents/{}/messages", self.base_url, agent_id)
    }

    fn redact(&self, text: &str) -> String {
        redact_credentials(text, &[&self.api_key])
    }
}

#[async_trait]
impl ActivationClient for LettaClient {
    async fn activate(
        &self,
        agent_id: &str,
        instruction: &str,
        timeout: Duration,
    ) -> Result<ActivationResult, EngineError> {
        let body = json!({
            "messages": [{"role": "user", "content": instruction}]
        });

        let resp = self.client
            .post(self.messages_url(agent_id))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout(format!(
                        "Letta request timed out after {}s",
                        timeout.as_secs()
                    ))
                } else {
                    let message = format!("Letta request failed: {}", e.without_url());
                    EngineError::Network(self.redact(&message))
                }
            })?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let detail = resp.text().await.unwrap_or_default();
            return Err(EngineError::RateLimit(self.redact(&format!("429 from Letta: {}", detail))));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(EngineError::Authentication(format!(
                "Letta rejected credentials ({})",
                status
            )));
        }
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(EngineError::Service {
                status: Some(status.as_u16()),
                message: self.redact(&detail),
            });
        }

        let data: Value = resp.json().await.map_err(|e| EngineError::Service {
            status: Some(status.as_u16()),
            message: format!("Failed to parse Letta response: {}", e),
        })?;

        // Some deployments report upstream provider failures inside a 200 body
        if let Some(error) = data.get("error").filter(|e| !e.is_null()) {
            let msg = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(EngineError::Service { status: None, message: self.redact(&msg) });
        }

        let result = ActivationResult::from_json(&data);
        debug!(
            agent_id,
            tool_calls = result.tool_call_count(),
            total_tokens = result.usage.as_ref().and_then(|u| u.total_tokens),
            "Letta activation returned"
        );
        Ok(result)
    }

    fn service_name(&self) -> &str { "letta" }
}
