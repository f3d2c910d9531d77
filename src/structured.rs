/*!
 * Extraction of JSON payloads from free-form model output.
 *
 * Models asked for JSON without native schema support tend to wrap it in
 * prose or code fences. `extract_json_string` cuts out the first balanced
 * object or array; `parse_structured` also deserializes it.
 *
 * The scan only counts the bracket kind that opened the payload and does not
 * track string literals. Stray brackets in the prose before the payload can
 * therefore pick the wrong start.
 */

use serde::de::DeserializeOwned;

use crate::errors::StructuredOutputError;

/// Slice of `text` holding its first JSON object or array
///
/// Starts at whichever of `{` or `[` appears first and ends where the nesting
/// depth of that bracket kind returns to zero. Returns `None` when there is no
/// opening bracket or the brackets never balance.
pub fn extract_json_string(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let open = text.as_bytes()[start];
    let close = if open == b'[' { b']' } else { b'}' };

    let mut depth = 0usize;
    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if *byte == open {
            depth += 1;
        } else if *byte == close {
            depth -= 1;
            if depth == 0 {
                return Some(text[start..=start + offset].trim());
            }
        }
    }

    None
}

/// Extract the JSON payload of `text` and deserialize it
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, StructuredOutputError> {
    let json = extract_json_string(text).ok_or(StructuredOutputError::NotFound)?;
    Ok(serde_json::from_str(json)?)
}
