// In crates/advisor/src/prompt.rs

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Instructions plus a structured context, rendered into the text sent to an advisor.
#[derive(Debug, Clone)]
pub struct Prompt {
    instructions: String,
    context: Map<String, Value>,
}

impl Prompt {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self { instructions: instructions.into(), context: Map::new() }
    }

    /// Adds a context entry. Values that fail to serialize are recorded as `null`.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.context.insert(key.to_string(), value);
        self
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn render(&self) -> String {
        let context = serde_json::to_string_pretty(&self.context).unwrap_or_else(|_| "{}".to_string());
        format!(
            "{}\n\nContext:\n{}\n\nRespond with a single JSON object and nothing else.",
            self.instructions.trim(),
            context
        )
    }
}

/// Pulls the first JSON object out of an advisor reply.
///
/// Models often wrap the object in prose or a fenced code block; everything
/// outside the outermost braces is ignored.
pub fn extract_json_object(raw: &str) -> Result<Map<String, Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Malformed("empty response".to_string()));
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(map);
    }

    let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) else {
        return Err(Error::Malformed("no JSON object found".to_string()));
    };
    if end < start {
        return Err(Error::Malformed("no JSON object found".to_string()));
    }
    match serde_json::from_str::<Value>(&trimmed[start..=end])? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Malformed(format!("expected an object, got {other}"))),
    }
}

/// Reads a number, accepting numeric strings such as `"1.25"`.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// The first of `keys` that is present and not `null`.
pub fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|key| map.get(*key)).find(|v| !v.is_null())
}

pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}
