//! OpenAI-compatible chat completions. Answers with one complete response.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::commit::prompt::COMMIT_INSTRUCTIONS;
use crate::config::BackendConfig;
use crate::error::{BackendError, StreamError};

use super::http;
use super::stream::{self, DeltaStream};
use super::{Backend, BackendKind};

pub const OPENAI_DEFAULT_HOST: &str = "https://api.openai.com/v1";

pub struct OpenAiBackend {
    client: Client,
    completions_url: Url,
    model: String,
    api_key: String,
}

impl OpenAiBackend {
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let kind = BackendKind::OpenAi;
        let host = http::or_default(config.host.as_deref(), OPENAI_DEFAULT_HOST);
        Ok(Self {
            client: http::build_client()?,
            completions_url: http::endpoint(kind, &host, "/chat/completions")?,
            model: http::require(kind, config.model.as_deref(), "model")?,
            api_key: http::require(kind, config.api_key.as_deref(), "api_key")?,
        })
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
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

fn first_choice(response: CompletionResponse) -> Result<String, StreamError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| StreamError::Decode("response contained no choices".to_string()))
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenAi
    }

    async fn generate(
        &self,
        cancel: &CancellationToken,
        diff: &str,
    ) -> Result<DeltaStream, BackendError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: COMMIT_INSTRUCTIONS,
                },
                ChatMessage {
                    role: "user",
                    content: diff,
                },
            ],
        };
        let request = self
            .client
            .post(self.completions_url.clone())
            .bearer_auth(&self.api_key)
            .json(&body);

        debug!("Sending {} chars of diff to OpenAI model {}", diff.len(), self.model);
        let response = http::send(BackendKind::OpenAi, request, cancel).await?;

        Ok(stream::spawn(cancel, move |tx| async move {
            let completion: CompletionResponse = http::read_json(response).await?;
            tx.send(first_choice(completion)?).await;
            Ok(())
        }))
    }
}
