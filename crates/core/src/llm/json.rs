use serde_json::{Map, Value};

/// Strips Markdown code fences and keeps the brace-delimited object inside, if any.
pub fn extract_json(text: &str) -> Option<String> {
    let mut inner = text.trim();
    if inner.starts_with("```") {
        // Drop the opening fence line (```json or ```), then everything from the closing fence.
        inner = match inner.split_once('\n') {
            Some((_, rest)) => rest,
            None => inner.trim_start_matches('`'),
        };
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        inner = inner.trim();
    }

    // Best-effort extraction: first '{' to last '}'.
    let start = inner.find('{')?;
    let end = inner.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(inner[start..=end].trim().to_string())
}

/// Parses model output into a JSON object without ever failing.
/// Anything unparseable, or parseable but not an object, becomes an empty object.
pub fn parse_lenient(text: &str) -> Value {
    let candidate = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    match serde_json::from_str::<Value>(&candidate) {
        Ok(v @ Value::Object(_)) => v,
        Ok(other) => {
            tracing::warn!(kind = json_kind(&other), "LLM output is JSON but not an object");
            Value::Object(Map::new())
        }
        Err(err) => {
            if !text.trim().is_empty() {
                tracing::warn!(error = %err, "LLM output is not valid JSON; substituting empty object");
            }
            Value::Object(Map::new())
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
