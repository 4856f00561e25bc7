//! Answer generation over retrieved context.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::azure::AzureDeployment;
use crate::error::ChatError;
use crate::models::{AzureConfig, RetrievalConfig};

/// Render the user prompt: each context item on its own `- ` line, then the question.
pub fn build_prompt(question: &str, context: &[String]) -> String {
    let formatted_context = context
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\nAnswer the question based only on the following context:\n{formatted_context}\n\nQuestion: {question}\n"
    )
}

/// Single-turn chat completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ChatError>;

    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an Azure OpenAI chat deployment.
#[derive(Debug, Clone)]
pub struct ChatClient {
    deployment: AzureDeployment,
    temperature: f32,
}

impl ChatClient {
    pub fn new(config: &AzureConfig, retrieval: &RetrievalConfig) -> Result<Self, ChatError> {
        let deployment =
            AzureDeployment::new(config, &config.chat_deployment, "chat/completions")
                .map_err(ChatError::ClientError)?;

        Ok(Self {
            deployment,
            temperature: retrieval.temperature,
        })
    }

    pub fn url(&self) -> &str {
        &self.deployment.url
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ChatError> {
        let request = ChatRequest {
            model: &self.deployment.deployment,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .deployment
            .client
            .post(&self.deployment.url)
            .header("api-key", &self.deployment.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout
                } else {
                    ChatError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::ServerError(format!("status {}: {}", status, body)));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        first_completion(chat_response)
    }

    fn model(&self) -> &str {
        &self.deployment.deployment
    }
}

fn first_completion(response: ChatResponse) -> Result<String, ChatError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ChatError::InvalidResponse("completion has no content".to_string()))
}
