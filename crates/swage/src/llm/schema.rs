//! Declarative validation of model responses.
//!
//! A [`SchemaSpec`] names the keys a response must carry, which of them must
//! coerce to a float, and which are restricted to an allowed set. Validation
//! never mutates the value: out-of-set strings are retained verbatim and
//! reported as violations so the caller can cap confidence instead of losing
//! information.

use serde_json::Value;

/// Expected shape of one model response.
#[derive(Debug, Clone, Default)]
pub struct SchemaSpec {
    required: Vec<&'static str>,
    numeric: Vec<&'static str>,
    enums: Vec<(&'static str, &'static [&'static str])>,
}

impl SchemaSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key must be present (any type).
    pub fn require(mut self, key: &'static str) -> Self {
        self.required.push(key);
        self
    }

    /// Key must be present and coerceable to f64.
    pub fn numeric(mut self, key: &'static str) -> Self {
        self.required.push(key);
        self.numeric.push(key);
        self
    }

    /// Optional numeric key: checked only when present.
    pub fn numeric_optional(mut self, key: &'static str) -> Self {
        self.numeric.push(key);
        self
    }

    /// Key, when present, should be one of the allowed labels.
    pub fn one_of(mut self, key: &'static str, allowed: &'static [&'static str]) -> Self {
        self.enums.push((key, allowed));
        self
    }

    /// Validate a parsed response. Returns violation descriptions; an empty
    /// vector means the response conforms.
    pub fn validate(&self, value: &Value) -> Vec<String> {
        let mut violations = Vec::new();
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => return vec!["response is not a JSON object".to_string()],
        };

        for key in &self.required {
            if !obj.contains_key(*key) || obj[*key].is_null() {
                violations.push(format!("missing required key '{}'", key));
            }
        }

        for key in &self.numeric {
            if let Some(v) = obj.get(*key) {
                if !v.is_null() && coerce_f64(v).is_none() {
                    violations.push(format!("key '{}' is not coerceable to a number", key));
                }
            }
        }

        for (key, allowed) in &self.enums {
            if let Some(v) = obj.get(*key) {
                if let Some(s) = v.as_str() {
                    let label = s.trim().to_lowercase();
                    if !allowed.iter().any(|a| *a == label) {
                        violations.push(format!("key '{}' has out-of-set value '{}'", key, s));
                    }
                }
            }
        }

        violations
    }
}

/// Coerce a JSON value to f64: numbers directly, strings via parse. Decimal
/// commas are tolerated since models echo German part descriptions.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Fetch a numeric field with coercion.
pub fn num_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(coerce_f64).filter(|f| f.is_finite())
}

/// Fetch a string field, trimmed.
pub fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Fetch an array of strings; non-string elements are skipped.
pub fn str_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
