//! Draining a delta stream into one string.

use tracing::debug;

use crate::backend::DeltaStream;
use crate::error::StreamError;

/// Concatenate every delta in emission order.
///
/// Stops at the first error and returns it; text gathered up to that point is
/// dropped.
pub async fn aggregate(mut stream: DeltaStream) -> Result<String, StreamError> {
    let mut text = String::new();
    let mut deltas = 0usize;

    while let Some(delta) = stream.next().await {
        text.push_str(&delta?);
        deltas += 1;
    }

    debug!("Aggregated {} deltas into {} chars", deltas, text.len());
    Ok(text)
}
