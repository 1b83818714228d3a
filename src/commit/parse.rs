//! Extracting the commit line from tagged model output.

use crate::error::{MissingTag, ParseError};

use super::prompt::{COMMIT_END_TAG, COMMIT_START_TAG};

/// Return the text between the first `<Commit>` and the first `</Commit>`
/// that follows it.
///
/// Nothing is trimmed. Text outside the tags, including any further tag
/// pairs, is ignored.
pub fn parse_commit_message(output: &str) -> Result<String, ParseError> {
    let start = output
        .find(COMMIT_START_TAG)
        .ok_or(ParseError::TagMissing(MissingTag::Start))?
        + COMMIT_START_TAG.len();

    let len = output[start..]
        .find(COMMIT_END_TAG)
        .ok_or(ParseError::TagMissing(MissingTag::End))?;

    Ok(output[start..start + len].to_string())
}
