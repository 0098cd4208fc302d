//! OpenAI adapter.
//!
//! Implements the `/v1/chat/completions` API with bearer-token auth.

use serde_json::Value;
use tw_domain::error::{Error, Result};

use crate::traits::Summarizer;
use crate::util::from_reqwest;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// A summary-generation adapter for the OpenAI chat completions API.
pub struct OpenAiSummarizer {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiSummarizer {
    pub fn new(api_key: String, model: Option<&str>, base_url: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            client,
        })
    }
}

fn build_body(model: &str, instruction: &str, content: &str) -> Value {
    serde_json::json!({
        "model": model,
        "messages": [
            {"role": "system", "content": instruction},
            {"role": "user", "content": content}
        ]
    })
}

fn parse_chat_response(body: &Value) -> Result<String> {
    let content = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| Error::Provider {
            provider: "openai".into(),
            message: "no message content in response".into(),
        })?;

    if content.is_empty() {
        return Err(Error::Provider {
            provider: "openai".into(),
            message: "empty message content".into(),
        });
    }
    Ok(content.to_string())
}

#[async_trait::async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn generate(&self, instruction: &str, content: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = build_body(&self.model, instruction, content);

        tracing::debug!(model = %self.model, "openai chat request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::Provider {
                provider: "openai".into(),
                message: format!("HTTP {} - {}", status.as_u16(), resp_text),
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        parse_chat_response(&resp_json)
    }

    fn provider_id(&self) -> &str {
        "openai"
    }
}
