//! Google Gemini, either through the consumer API or a Vertex AI project.
//!
//! Both speak the same `streamGenerateContent` protocol with `alt=sse`; they
//! differ in endpoint layout and authentication.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::commit::prompt::COMMIT_INSTRUCTIONS;
use crate::config::BackendConfig;
use crate::error::{BackendError, StreamError};

use super::http::{self, Line};
use super::stream::{self, DeltaStream};
use super::{Backend, BackendKind};

/// Default host for the consumer Gemini API.
pub const GEMINI_DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com/v1beta";

const TEMPERATURE: f32 = 0.75;

#[derive(Debug, Clone)]
enum Auth {
    /// `x-goog-api-key` header (consumer API).
    ApiKey(String),
    /// OAuth access token (Vertex AI).
    Bearer(String),
}

pub struct GeminiBackend {
    kind: BackendKind,
    client: Client,
    url: Url,
    auth: Auth,
}

impl GeminiBackend {
    /// Consumer Gemini API authenticated with an API key.
    pub fn gemini(config: &BackendConfig) -> Result<Self, BackendError> {
        let kind = BackendKind::Gemini;
        let host = http::or_default(config.host.as_deref(), GEMINI_DEFAULT_HOST);
        let model = http::require(kind, config.model.as_deref(), "model")?;
        let api_key = http::require(kind, config.api_key.as_deref(), "api_key")?;

        Ok(Self {
            kind,
            client: http::build_client()?,
            url: http::endpoint(
                kind,
                &host,
                &format!("/models/{model}:streamGenerateContent?alt=sse"),
            )?,
            auth: Auth::ApiKey(api_key),
        })
    }

    /// Vertex AI, scoped to a project and region.
    ///
    /// `api_key` holds an OAuth access token sent as a bearer credential.
    pub fn vertex(config: &BackendConfig) -> Result<Self, BackendError> {
        let kind = BackendKind::Vertex;
        let model = http::require(kind, config.model.as_deref(), "model")?;
        let token = http::require(kind, config.api_key.as_deref(), "api_key")?;
        let location = http::require(kind, config.location.as_deref(), "location")?;
        let project = http::require(kind, config.project.as_deref(), "project")?;
        let host = http::or_default(
            config.host.as_deref(),
            &format!("https://{location}-aiplatform.googleapis.com"),
        );

        Ok(Self {
            kind,
            client: http::build_client()?,
            url: http::endpoint(
                kind,
                &host,
                &format!(
                    "/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:streamGenerateContent?alt=sse"
                ),
            )?,
            auth: Auth::Bearer(token),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 2],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// The instruction goes first as a user turn, the diff second.
fn build_request(diff: &str) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: [
            Content {
                role: "user",
                parts: [Part {
                    text: COMMIT_INSTRUCTIONS,
                }],
            },
            Content {
                role: "user",
                parts: [Part { text: diff }],
            },
        ],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
        },
    }
}

fn decode_event(line: &str) -> Result<Line, StreamError> {
    let Some(data) = http::sse_data(line) else {
        return Ok(Line::Skip);
    };

    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!("Failed to parse Gemini chunk: {} - data: {}", e, data);
            return Ok(Line::Skip);
        }
    };

    if let Some(error) = chunk.error {
        return Err(StreamError::Backend(error.message));
    }

    let text: String = chunk
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        Ok(Line::Skip)
    } else {
        Ok(Line::Delta(text))
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn generate(
        &self,
        cancel: &CancellationToken,
        diff: &str,
    ) -> Result<DeltaStream, BackendError> {
        let request = self.client.post(self.url.clone()).json(&build_request(diff));
        let request = match &self.auth {
            Auth::ApiKey(key) => request.header("x-goog-api-key", key),
            Auth::Bearer(token) => request.bearer_auth(token),
        };

        debug!("Sending {} chars of diff to {}", diff.len(), self.kind);
        let response = http::send(self.kind, request, cancel).await?;

        Ok(stream::spawn(cancel, move |tx| async move {
            http::pump_lines(response, &tx, decode_event).await
        }))
    }
}
