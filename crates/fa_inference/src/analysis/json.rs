use fa_core::{Error, Result};
use serde_json::Value;

/// Removes an optional Markdown code fence around model output.
///
/// Both a `json`-tagged fence and a bare fence are accepted; text without a
/// fence is returned trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    let fenced = raw
        .split_once("```json")
        .or_else(|| raw.split_once("```"))
        .map(|(_, rest)| rest.split("```").next().unwrap_or(rest));
    fenced.unwrap_or(raw).trim()
}

/// Parses model output as a JSON value, stripping a code fence first and
/// falling back to the outermost `{...}` span when prose surrounds it.
pub fn parse_json(raw: &str) -> Result<Value> {
    let body = strip_code_fence(raw);
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Ok(value);
    }
    if let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&body[start..=end]) {
                return Ok(value);
            }
        }
    }
    Err(Error::MalformedOutput(format!(
        "expected JSON, got: {}",
        body.chars().take(120).collect::<String>()
    )))
}

/// Like [`parse_json`] but requires a JSON object.
pub fn parse_json_object(raw: &str) -> Result<serde_json::Map<String, Value>> {
    match parse_json(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::MalformedOutput(format!(
            "expected a JSON object, got {}",
            match other {
                Value::Array(_) => "an array",
                Value::String(_) => "a string",
                Value::Number(_) => "a number",
                Value::Bool(_) => "a boolean",
                _ => "null",
            }
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"label": "positive", "score": 0.8}"#;

    #[test]
    fn test_strip_json_fence() {
        let raw = format!("```json\n{}\n```", BODY);
        assert_eq!(strip_code_fence(&raw), BODY);
    }

    #[test]
    fn test_strip_bare_fence() {
        let raw = format!("Here you go:\n```\n{}\n```\nThanks", BODY);
        assert_eq!(strip_code_fence(&raw), BODY);
    }

    #[test]
    fn test_unfenced_is_untouched() {
        assert_eq!(strip_code_fence(BODY), BODY);
        assert_eq!(strip_code_fence(&format!("  {}\n", BODY)), BODY);
    }

    #[test]
    fn test_stripping_is_idempotent() {
        let raw = format!("```json\n{}\n```", BODY);
        let once = strip_code_fence(&raw);
        assert_eq!(strip_code_fence(once), once);
    }

    #[test]
    fn test_fenced_and_unfenced_parse_identically() {
        let fenced = parse_json(&format!("```json\n{}\n```", BODY)).unwrap();
        let bare = parse_json(BODY).unwrap();
        assert_eq!(fenced, bare);
    }

    #[test]
    fn test_prose_around_object() {
        let value = parse_json(&format!("Sure! {} Hope that helps.", BODY)).unwrap();
        assert_eq!(value["label"], "positive");
    }

    #[test]
    fn test_malformed_output() {
        assert!(matches!(parse_json("not json at all"), Err(Error::MalformedOutput(_))));
        assert!(matches!(parse_json_object("[1, 2]"), Err(Error::MalformedOutput(_))));
        assert!(parse_json_object(BODY).is_ok());
    }
}
