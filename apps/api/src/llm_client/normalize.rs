//! Turns raw completion text into JSON.

use serde::de::Error as _;
use serde_json::Value;
use tracing::warn;

use super::LlmError;

/// Strips a surrounding markdown code fence, tagged (```json, ```JSON, ```js)
/// or untagged. Text without a leading fence is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // A language tag is a run of letters right after the fence. Objects and
    // arrays never start with a letter, so this cannot eat the payload.
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let body = rest[tag_len..].trim_start();

    body.strip_suffix("```")
        .map(str::trim_end)
        .unwrap_or(body)
}

/// Parses completion text as JSON after fence stripping.
///
/// On failure the raw text is logged and carried in the error; callers must
/// not echo it back to end users.
pub fn parse_json_value(text: &str) -> Result<Value, LlmError> {
    let stripped = strip_code_fences(text);
    serde_json::from_str(stripped).map_err(|source| {
        warn!(
            "Model output is not valid JSON ({source}); raw output: {}",
            truncate_for_log(text)
        );
        LlmError::InvalidResponseFormat {
            raw: text.to_string(),
            source,
        }
    })
}

/// Like [`parse_json_value`], but only a JSON object is accepted. Scalars and
/// arrays are `InvalidResponseFormat`.
pub fn parse_json_object(text: &str) -> Result<Value, LlmError> {
    let value = parse_json_value(text)?;
    if value.is_object() {
        return Ok(value);
    }
    warn!(
        "Model output is JSON but not an object; raw output: {}",
        truncate_for_log(text)
    );
    Err(LlmError::InvalidResponseFormat {
        raw: text.to_string(),
        source: serde_json::Error::custom("expected a JSON object"),
    })
}

fn truncate_for_log(text: &str) -> String {
    const MAX: usize = 500;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        format!("{}…", text.chars().take(MAX).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_code_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_uppercase_tag_single_line() {
        assert_eq!(strip_code_fences("```JSON {\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_code_fences_no_fences() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_missing_closing_fence() {
        assert_eq!(strip_code_fences("```json\n[1, 2]"), "[1, 2]");
    }

    #[test]
    fn test_fenced_object_parses_deep_equal() {
        let original = json!({
            "overallScore": 82,
            "recommendation": "GOOD_MATCH",
            "strengths": ["Rust", "Postgres"],
            "nested": {"a": [1, 2, {"b": null}]}
        });
        let fenced = format!("```json\n{}\n```", serde_json::to_string_pretty(&original).unwrap());
        assert_eq!(parse_json_value(&fenced).unwrap(), original);
    }

    #[test]
    fn test_truncated_json_is_invalid_response_format() {
        let err = parse_json_value("```json\n{\"overallScore\": 82, \"strengths\": [\"a\"\n```")
            .unwrap_err();
        match err {
            LlmError::InvalidResponseFormat { raw, .. } => assert!(raw.contains("overallScore")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_object_required_for_structured_output() {
        let value = parse_json_object("```json\n{\"overallScore\": 70}\n```").unwrap();
        assert_eq!(value["overallScore"], 70);

        for text in ["\"GOOD_MATCH\"", "82", "[1, 2]", "null"] {
            assert!(
                matches!(
                    parse_json_object(text),
                    Err(LlmError::InvalidResponseFormat { .. })
                ),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn test_prose_is_invalid_response_format() {
        assert!(matches!(
            parse_json_value("Sure! Here is the evaluation you asked for."),
            Err(LlmError::InvalidResponseFormat { .. })
        ));
    }
}
