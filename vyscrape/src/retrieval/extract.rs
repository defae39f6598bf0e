//! Isolating the JSON payload in terminal output.
//!
//! The payload is taken to run from the first `{` to the last `}`. This
//! tolerates prompts and echoes on both sides of it, but a stray brace in
//! banner or prompt text outside the payload will widen the candidate and
//! make it unparseable. Braces are not balanced and string literals are not
//! tracked.

use memchr::{memchr, memrchr};
use serde_json::Value;

use crate::error::{PayloadError, excerpt};

/// Locate the candidate JSON text between the first `{` and the last `}`.
pub fn extract_candidate(text: &str) -> Result<&str, PayloadError> {
    let bytes = text.as_bytes();
    let not_found = || PayloadError::NotFound {
        excerpt: excerpt(text),
    };

    let start = memchr(b'{', bytes).ok_or_else(not_found)?;
    let end = memrchr(b'}', bytes).ok_or_else(not_found)?;
    if end < start {
        return Err(not_found());
    }

    Ok(&text[start..=end])
}

/// Extract and parse the JSON document embedded in `text`.
pub fn parse_payload(text: &str) -> Result<Value, PayloadError> {
    let candidate = extract_candidate(text)?;
    serde_json::from_str(candidate).map_err(|source| PayloadError::Malformed {
        excerpt: excerpt(candidate),
        source,
    })
}
