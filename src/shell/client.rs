use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::relay::schema::{ActionContext, ActionRequest, Scenario, ScenarioRequest, TurnOutcome};
use crate::relay::theme::Theme;

/// HTTP client for a running relay server.
#[derive(Clone)]
pub struct RelayClient {
    http: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/api/health", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("relay unreachable at {}", self.base_url))?;
        if !resp.status().is_success() {
            return Err(anyhow!("relay health check returned {}", resp.status()));
        }
        Ok(())
    }

    pub async fn start(&self, theme: &Theme, difficulty: &str) -> Result<Scenario> {
        let body = ScenarioRequest {
            theme: Some(theme.id().to_string()),
            difficulty: Some(difficulty.to_string()),
        };
        self.post("/api/generate-scenario", &body).await
    }

    pub async fn act(&self, action: &str, context: ActionContext) -> Result<TurnOutcome> {
        let body = ActionRequest {
            action: action.to_string(),
            current_context: context,
        };
        self.post("/api/submit-action", &body).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("relay returned {}: {}", status, error_message(&text)));
        }
        resp.json::<T>()
            .await
            .with_context(|| format!("malformed response from {}", url))
    }
}

/// The `error` (and `details`) fields of a relay error body, or the body itself.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(v) => {
            let error = v.get("error").and_then(Value::as_str).unwrap_or("unknown error");
            match v.get("details").and_then(Value::as_str) {
                Some(details) => format!("{} ({})", error, details),
                None => error.to_string(),
            }
        }
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"error": "Missing API Key"}"#), "Missing API Key");
        assert_eq!(
            error_message(r#"{"error": "Internal server error", "details": "timed out"}"#),
            "Internal server error (timed out)"
        );
        assert_eq!(error_message(" Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn base_url_is_normalised() {
        let c = RelayClient::new("http://localhost:3001/", Duration::from_secs(1));
        assert_eq!(c.base_url(), "http://localhost:3001");
    }
}
