//! Local inference through an Ollama server.
//!
//! Ollama streams newline-delimited JSON chunks from `/api/chat`; the last
//! chunk carries `"done": true`.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::commit::prompt::COMMIT_INSTRUCTIONS;
use crate::config::{BackendConfig, DEFAULT_OLLAMA_HOST};
use crate::error::{BackendError, StreamError};

use super::http::{self, Line};
use super::stream::{self, DeltaStream};
use super::{Backend, BackendKind};

pub struct OllamaBackend {
    client: Client,
    chat_url: Url,
    model: String,
}

impl OllamaBackend {
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let kind = BackendKind::Ollama;
        let host = http::or_default(config.host.as_deref(), DEFAULT_OLLAMA_HOST);
        Ok(Self {
            client: http::build_client()?,
            chat_url: http::endpoint(kind, &host, "/api/chat")?,
            model: http::require(kind, config.model.as_deref(), "model")?,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

fn decode_chunk(line: &str) -> Result<Line, StreamError> {
    let chunk: ChatChunk = match serde_json::from_str(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!("Failed to parse Ollama chunk: {} - line: {}", e, line);
            return Ok(Line::Skip);
        }
    };

    if let Some(error) = chunk.error {
        return Err(StreamError::Backend(error));
    }
    if chunk.done {
        return Ok(Line::Done);
    }

    match chunk.message {
        Some(message) if !message.content.is_empty() => Ok(Line::Delta(message.content)),
        _ => Ok(Line::Skip),
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    async fn generate(
        &self,
        cancel: &CancellationToken,
        diff: &str,
    ) -> Result<DeltaStream, BackendError> {
        let request = ChatRequest {
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
            stream: true,
        };

        debug!("Sending {} chars of diff to Ollama model {}", diff.len(), self.model);
        let response = http::send(
            BackendKind::Ollama,
            self.client.post(self.chat_url.clone()).json(&request),
            cancel,
        )
        .await?;

        Ok(stream::spawn(cancel, move |tx| async move {
            http::pump_lines(response, &tx, decode_chunk).await
        }))
    }
}
