//! OpenAI sentiment scorer
//!
//! Sends one chat-completion request per headline and parses the reply as
//! a whole number. No retries: a failed or non-numeric answer is surfaced
//! as a `ScorerError` and the caller decides what to do with the task.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapters::errors::{ScorerError, ScorerResult};
use crate::adapters::traits::SentimentScorer;
use crate::adapters::types::create_http_client;

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// Instruction prepended to every headline
pub const SENTIMENT_PROMPT: &str = "Answer only with whole numbers.Rate from 1-100 the impact \
that this headline has on the company, anything above 50 is considered positive impact and \
below 50 is considered negative impact.Headline:";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Parse a model reply into a score
pub fn parse_score(reply: &str) -> ScorerResult<i64> {
    let trimmed = reply.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| ScorerError::NotANumber(trimmed.to_string()))
}

pub struct OpenAiScorer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiScorer {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: create_http_client("openai"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SentimentScorer for OpenAiScorer {
    async fn score(&self, headline: &str) -> ScorerResult<i64> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: format!("{}{}", SENTIMENT_PROMPT, headline),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScorerError::Api { status: status.as_u16(), body });
        }

        let completion: ChatResponse = response.json().await?;
        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ScorerError::EmptyResponse)?;

        debug!(model = %self.model, reply = %reply, "[SENTIMENT] Model reply");
        parse_score(&reply)
    }
}
