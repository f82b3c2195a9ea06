use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::message::Message;
use crate::models::tool::Tool;

/// Linear pricing applied to token counts, dollars per token.
const PROMPT_TOKEN_PRICE: f64 = 0.10 / 1_000_000.0;
const COMPLETION_TOKEN_PRICE: f64 = 0.40 / 1_000_000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        prompt_tokens: Option<i32>,
        completion_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }

    /// Estimated request cost in dollars. Only useful as an order of
    /// magnitude; the pricing constants are not per-model.
    pub fn estimated_cost(&self) -> f64 {
        let prompt = self.prompt_tokens.unwrap_or(0) as f64;
        let completion = self.completion_tokens.unwrap_or(0) as f64;
        prompt * PROMPT_TOKEN_PRICE + completion * COMPLETION_TOKEN_PRICE
    }
}

/// The outcome of one chat-completion round trip.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The decoded response message, with any thought trace removed
    pub message: Message,
    /// The reasoning trace the model emitted before its answer, or a
    /// sentinel when the model provided none
    pub thoughts: String,
    pub usage: Usage,
}

/// Base trait for chat-completion backends
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next message for the given exchange. `tools` may be
    /// empty, in which case the model cannot request tool use.
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<Completion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_creation() {
        let usage = Usage::new(Some(10), Some(20), Some(30));
        assert_eq!(usage.prompt_tokens, Some(10));
        assert_eq!(usage.completion_tokens, Some(20));
        assert_eq!(usage.total_tokens, Some(30));
    }

    #[test]
    fn test_estimated_cost() {
        let usage = Usage::new(Some(1_000_000), Some(1_000_000), None);
        assert!((usage.estimated_cost() - 0.50).abs() < 1e-9);
        assert_eq!(Usage::default().estimated_cost(), 0.0);
    }

    #[test]
    fn test_usage_serialization() -> Result<()> {
        let usage = Usage::new(Some(10), Some(20), Some(30));
        let serialized = serde_json::to_string(&usage)?;
        let deserialized: Usage = serde_json::from_str(&serialized)?;
        assert_eq!(usage, deserialized);
        Ok(())
    }
}
