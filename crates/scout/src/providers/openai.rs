use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use super::base::{Completion, Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    messages_to_openai_spec, openai_response_to_message, split_thoughts, tools_to_openai_spec,
    NO_THOUGHTS,
};
use crate::models::message::{Message, MessageContent};
use crate::models::tool::Tool;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Usage {
        let usage = match data.get("usage") {
            Some(usage) => usage,
            None => return Usage::default(),
        };

        let prompt_tokens = usage
            .get("prompt_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let completion_tokens = usage
            .get("completion_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let total_tokens = usage
            .get("total_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
            .or_else(|| match (prompt_tokens, completion_tokens) {
                (Some(prompt), Some(completion)) => Some(prompt + completion),
                _ => None,
            });

        Usage::new(prompt_tokens, completion_tokens, total_tokens)
    }

    /// POST the payload, retrying 429s with capped exponential backoff.
    /// Every other non-2xx status, network failure, or decode failure is
    /// a permanent failure for this call.
    async fn post(&self, payload: Value) -> Result<Value> {
        let mut delay = self.config.retry.initial_backoff;
        let mut attempt: u32 = 0;

        loop {
            let response = self
                .client
                .post(&self.config.endpoint)
                .header("Authorization", format!("Bearer {}", self.config.api_key))
                .json(&payload)
                .send()
                .await?;

            match response.status() {
                StatusCode::OK => return Ok(response.json().await?),
                StatusCode::TOO_MANY_REQUESTS => {
                    attempt += 1;
                    if attempt > self.config.retry.max_retries {
                        return Err(anyhow!(
                            "rate limited: gave up after {} retries",
                            self.config.retry.max_retries
                        ));
                    }
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.config.retry.max_backoff);
                }
                status => return Err(anyhow!("API error: {}", status)),
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<Completion> {
        let mut messages_array = Vec::new();
        if !system.is_empty() {
            messages_array.push(json!({
                "role": "system",
                "content": system
            }));
        }
        messages_array.extend(messages_to_openai_spec(messages));

        let mut payload = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": messages_array,
        });

        let tools_spec = tools_to_openai_spec(tools)?;
        if !tools_spec.is_empty() {
            payload
                .as_object_mut()
                .unwrap()
                .insert("tools".to_string(), json!(tools_spec));
        }

        let start = Instant::now();
        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("API error: {}", error));
        }

        let mut message = openai_response_to_message(&response)?;
        let usage = Self::get_usage(&response);

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            cost_cents = usage.estimated_cost() * 100.0,
            prompt_tokens = usage.prompt_tokens.unwrap_or(0),
            completion_tokens = usage.completion_tokens.unwrap_or(0),
            "completion finished"
        );

        let mut thoughts = NO_THOUGHTS.to_string();
        for content in &mut message.content {
            if let MessageContent::Text(text) = content {
                let (trace, visible) = split_thoughts(&text.text);
                if let Some(trace) = trace {
                    thoughts = trace;
                    text.text = visible;
                }
            }
        }

        Ok(Completion {
            message,
            thoughts,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Message;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> OpenAiProviderConfig {
        let mut config = OpenAiProviderConfig::new(
            format!("{}/v1/chat/completions", server.uri()),
            "test_api_key",
            "gpt-4.1-mini",
        );
        config.retry.initial_backoff = Duration::from_millis(10);
        config.retry.max_backoff = Duration::from_millis(40);
        config
    }

    fn text_response_body() -> Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Ready to work."
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        })
    }

    #[tokio::test]
    async fn test_complete_basic() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response_body()))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(test_config(&server))?;
        let messages = vec![Message::user().with_text("Are you ready?")];
        let completion = provider
            .complete("You are a helpful assistant.", &messages, &[])
            .await?;

        assert_eq!(completion.message.text(), "Ready to work.");
        assert_eq!(completion.thoughts, NO_THOUGHTS);
        assert_eq!(completion.usage.prompt_tokens, Some(12));
        assert_eq!(completion.usage.completion_tokens, Some(15));
        assert_eq!(completion.usage.total_tokens, Some(27));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_thought_extraction() -> Result<()> {
        let server = MockServer::start().await;
        let body = json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Let me check the manifest.</think>\nThree crates."
                },
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(test_config(&server))?;
        let messages = vec![Message::user().with_text("How many crates?")];
        let completion = provider.complete("persona", &messages, &[]).await?;

        assert_eq!(completion.thoughts, "Let me check the manifest.</think>");
        assert_eq!(completion.message.text(), "\nThree crates.");
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_tool_request() -> Result<()> {
        let server = MockServer::start().await;
        let body = json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "browse_directory",
                            "arguments": "{\"path\":\".\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 20, "completion_tokens": 15, "total_tokens": 35}
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(test_config(&server))?;
        let tool = Tool::new(
            "browse_directory",
            "List the immediate children of a target directory.",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"}
                },
                "required": ["path"]
            }),
        );

        let messages = vec![Message::user().with_text("What is here?")];
        let completion = provider.complete("persona", &messages, &[tool]).await?;

        let requests = completion.message.tool_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, "call_123");
        let call = requests[0].tool_call.as_ref().unwrap();
        assert_eq!(call.name, "browse_directory");
        assert_eq!(call.arguments, json!({"path": "."}));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_retries_rate_limit() -> Result<()> {
        let server = MockServer::start().await;
        // Two 429s, then success: three requests total
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response_body()))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(test_config(&server))?;
        let messages = vec![Message::user().with_text("hi")];
        let completion = provider.complete("persona", &messages, &[]).await?;

        assert_eq!(completion.message.text(), "Ready to work.");
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_rate_limit_exhaustion() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let mut config = test_config(&server);
        config.retry.max_retries = 2;
        let provider = OpenAiProvider::new(config)?;
        let messages = vec![Message::user().with_text("hi")];
        let err = provider.complete("persona", &messages, &[]).await.unwrap_err();

        assert!(err.to_string().contains("rate limited"));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_server_error_is_permanent() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(test_config(&server))?;
        let messages = vec![Message::user().with_text("hi")];
        let err = provider.complete("persona", &messages, &[]).await.unwrap_err();

        assert!(err.to_string().contains("API error"));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_empty_choices() -> Result<()> {
        let server = MockServer::start().await;
        let body = json!({"choices": [], "usage": {}});
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(test_config(&server))?;
        let messages = vec![Message::user().with_text("hi")];
        let err = provider.complete("persona", &messages, &[]).await.unwrap_err();

        assert_eq!(err.to_string(), "no response");
        Ok(())
    }
}
