//! Shared HTTP plumbing for the network backends.

use std::env;
use std::time::Duration;

use futures::TryStreamExt;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{BackendError, StreamError};

use super::BackendKind;
use super::stream::DeltaSender;

/// Default timeout for a whole backend request, body included.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variable to override the default timeout.
pub const TIMEOUT_ENV_VAR: &str = "COMMITLINE_TIMEOUT";

/// Longest error body kept in a `BackendError`.
const MAX_ERROR_BODY: usize = 500;

/// Get the configured timeout duration.
///
/// Reads from COMMITLINE_TIMEOUT if set, otherwise uses 120 seconds.
/// Invalid values log a warning and fall back to the default.
pub(crate) fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

pub(crate) fn build_client() -> Result<Client, BackendError> {
    Client::builder()
        .timeout(get_timeout())
        .build()
        .map_err(BackendError::Client)
}

/// A required, non-blank setting from a backend record.
pub(crate) fn require(
    backend: BackendKind,
    value: Option<&str>,
    field: &'static str,
) -> Result<String, BackendError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(BackendError::MissingSetting { backend, field }),
    }
}

/// An optional setting, falling back to `default` when absent or blank.
pub(crate) fn or_default(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Join `base` and `path` into a validated URL.
pub(crate) fn endpoint(backend: BackendKind, base: &str, path: &str) -> Result<Url, BackendError> {
    let url = format!("{}{}", base.trim_end_matches('/'), path);
    Url::parse(&url).map_err(|_| BackendError::InvalidEndpoint { backend, url })
}

/// Send a request and fail unless the service answered with a 2xx status.
pub(crate) async fn send(
    backend: BackendKind,
    request: RequestBuilder,
    cancel: &CancellationToken,
) -> Result<Response, BackendError> {
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(BackendError::Cancelled { backend }),
        result = request.send() => result.map_err(|source| BackendError::Request { backend, source })?,
    };

    let status = response.status();
    if status.is_success() {
        debug!("{} accepted request (HTTP {})", backend, status.as_u16());
        return Ok(response);
    }

    let body = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(BackendError::Cancelled { backend }),
        text = response.text() => text.unwrap_or_default(),
    };
    let body: String = body.chars().take(MAX_ERROR_BODY).collect();
    let status = status.as_u16();

    Err(match status {
        401 | 403 => BackendError::Unauthorized {
            backend,
            status,
            body,
        },
        _ => BackendError::Status {
            backend,
            status,
            body,
        },
    })
}

/// Read a complete JSON body inside a producer task.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StreamError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| StreamError::Read(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| StreamError::Decode(e.to_string()))
}

/// What a line-oriented decoder made of one line of the response body.
pub(crate) enum Line {
    Delta(String),
    Skip,
    Done,
}

/// Forward a line-delimited response body (NDJSON or SSE) to `tx`.
///
/// Stops at EOF, when `decode` reports `Line::Done`, or when the consumer
/// is gone.
pub(crate) async fn pump_lines<F>(
    response: Response,
    tx: &DeltaSender,
    mut decode: F,
) -> Result<(), StreamError>
where
    F: FnMut(&str) -> Result<Line, StreamError>,
{
    let byte_stream = response.bytes_stream().map_err(std::io::Error::other);
    let mut reader = BufReader::new(StreamReader::new(byte_stream));
    let mut line_buffer = String::new();

    loop {
        line_buffer.clear();
        let read = reader
            .read_line(&mut line_buffer)
            .await
            .map_err(|e| StreamError::Read(e.to_string()))?;
        if read == 0 {
            return Ok(());
        }

        let line = line_buffer.trim();
        if line.is_empty() {
            continue;
        }

        match decode(line)? {
            Line::Delta(text) => {
                if !tx.send(text).await {
                    debug!("Consumer dropped the stream, stopping");
                    return Ok(());
                }
            }
            Line::Skip => {}
            Line::Done => return Ok(()),
        }
    }
}

/// The JSON payload of an SSE `data:` line, if this is one.
pub(crate) fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}
