/*!
 * Tests for structured output extraction
 */

use serde::Deserialize;

use aisylum::errors::StructuredOutputError;
use aisylum::structured::{extract_json_string, parse_structured};

#[derive(Debug, Deserialize, PartialEq)]
struct Verdict {
    correct: bool,
    hint: String,
}

/// Test a payload wrapped in a markdown code fence
#[test]
fn test_extract_withCodeFence_shouldReturnPayload() {
    let text = "```json\n{\"correct\": true, \"hint\": \"\"}\n```";
    assert_eq!(extract_json_string(text), Some("{\"correct\": true, \"hint\": \"\"}"));
}

/// Test that the bracket opening first decides the payload kind
#[test]
fn test_extract_withObjectBeforeArray_shouldReturnObject() {
    let text = r#"{"items": [1, 2]} and then [3, 4]"#;
    assert_eq!(extract_json_string(text), Some(r#"{"items": [1, 2]}"#));
}

/// Test that unbalanced output yields nothing
#[test]
fn test_extract_withTruncatedOutput_shouldReturnNone() {
    assert_eq!(extract_json_string(r#"[{"question": "Hola?"#), None);
}

/// Test the known limitation with brackets inside string literals
#[test]
fn test_extract_withBracketInString_shouldCutEarly() {
    let text = r#"{"hint": "use } carefully"}"#;
    assert_eq!(extract_json_string(text), Some(r#"{"hint": "use }"#));
    assert!(parse_structured::<Verdict>(text).is_err());
}

/// Test typed parsing and its two failure kinds
#[test]
fn test_parse_structured_withVariousOutputs_shouldReportKind() {
    let verdict: Verdict = parse_structured(r#"Result: {"correct": false, "hint": "accent"}"#).unwrap();
    assert_eq!(
        verdict,
        Verdict {
            correct: false,
            hint: "accent".to_string()
        }
    );

    assert!(matches!(
        parse_structured::<Verdict>("I cannot answer that."),
        Err(StructuredOutputError::NotFound)
    ));
    assert!(matches!(
        parse_structured::<Verdict>(r#"{"correct": "maybe"}"#),
        Err(StructuredOutputError::Invalid(_))
    ));
}
