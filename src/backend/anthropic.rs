//! Anthropic Messages API. Answers with one complete response.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::commit::prompt::COMMIT_INSTRUCTIONS;
use crate::config::BackendConfig;
use crate::error::BackendError;

use super::http;
use super::stream::{self, DeltaStream};
use super::{Backend, BackendKind};

pub const ANTHROPIC_DEFAULT_HOST: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

pub struct AnthropicBackend {
    client: Client,
    messages_url: Url,
    model: String,
    api_key: String,
}

impl AnthropicBackend {
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let kind = BackendKind::Anthropic;
        let host = http::or_default(config.host.as_deref(), ANTHROPIC_DEFAULT_HOST);
        Ok(Self {
            client: http::build_client()?,
            messages_url: http::endpoint(kind, &host, "/v1/messages")?,
            model: http::require(kind, config.model.as_deref(), "model")?,
            api_key: http::require(kind, config.api_key.as_deref(), "api_key")?,
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// All text blocks of a response, in order, as one string.
fn response_text(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text)
        .collect()
}

#[async_trait]
impl Backend for AnthropicBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Anthropic
    }

    async fn generate(
        &self,
        cancel: &CancellationToken,
        diff: &str,
    ) -> Result<DeltaStream, BackendError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: COMMIT_INSTRUCTIONS,
            messages: [Message {
                role: "user",
                content: diff,
            }],
        };
        let request = self
            .client
            .post(self.messages_url.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        debug!("Sending {} chars of diff to Anthropic model {}", diff.len(), self.model);
        let response = http::send(BackendKind::Anthropic, request, cancel).await?;

        Ok(stream::spawn(cancel, move |tx| async move {
            let message: MessagesResponse = http::read_json(response).await?;
            tx.send(response_text(message)).await;
            Ok(())
        }))
    }
}
