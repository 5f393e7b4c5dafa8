//! JSON redaction for volatile snapshot fields
//!
//! Payloads that embed timestamps, process ids or other volatile values
//! cannot be compared byte-for-byte across runs. [`JsonFilter`] rewrites
//! such fields in place before the payload reaches the recorder.
//!
//! Example:
//!
//! ```
//! use keepsake::redact::JsonFilter;
//! use serde_json::Value;
//!
//! let redacted = JsonFilter::parse(r#"{"pid": 1234, "msg": "started"}"#)
//!     .unwrap()
//!     .transform_objects(|obj| {
//!         if obj.contains_key("pid") {
//!             obj.insert("pid".to_string(), Value::from(0));
//!         }
//!     })
//!     .to_str();
//!
//! assert_eq!(redacted, r#"{"pid":0,"msg":"started"}"#);
//! ```

use serde_json::{Map, Value};

use crate::Result;

/// Rewrites nested JSON objects before they are recorded or compared.
#[derive(Debug, Clone)]
pub struct JsonFilter {
    value: Value,
}

impl JsonFilter {
    /// Parse JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Json`](crate::KeepsakeError::Json) if the
    /// input is not valid JSON.
    pub fn parse(data: &str) -> Result<Self> {
        Ok(Self {
            value: serde_json::from_str(data)?,
        })
    }

    /// Wrap an already-parsed JSON value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Apply `visitor` to every object in the tree, parents before
    /// children.
    ///
    /// Only object-valued children are descended into. Arrays are not:
    /// objects inside arrays are left untouched.
    #[must_use]
    pub fn transform_objects<F>(mut self, mut visitor: F) -> Self
    where
        F: FnMut(&mut Map<String, Value>),
    {
        transform_object(&mut self.value, &mut visitor);
        self
    }

    /// Serialize in minimal form, suitable for deterministic comparison.
    #[must_use]
    pub fn to_str(&self) -> String {
        self.value.to_string()
    }

    /// Return the (possibly rewritten) JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }
}

fn transform_object<F>(value: &mut Value, visitor: &mut F)
where
    F: FnMut(&mut Map<String, Value>),
{
    if let Value::Object(object) = value {
        visitor(object);
        for child in object.values_mut() {
            if child.is_object() {
                transform_object(child, visitor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn zero_pid(obj: &mut Map<String, Value>) {
        if obj.contains_key("pid") {
            obj.insert("pid".to_string(), Value::from(0));
        }
    }

    #[test]
    fn test_redacts_nested_objects() {
        let filtered = JsonFilter::new(json!({
            "pid": 1234,
            "nested": {"pid": 5678, "x": 1}
        }))
        .transform_objects(zero_pid);

        assert_eq!(
            filtered.into_value(),
            json!({"pid": 0, "nested": {"pid": 0, "x": 1}})
        );
    }

    #[test]
    fn test_arrays_are_not_descended_into() {
        let filtered = JsonFilter::new(json!({
            "pid": 1,
            "children": [{"pid": 2}, {"pid": 3}]
        }))
        .transform_objects(zero_pid);

        assert_eq!(
            filtered.into_value(),
            json!({"pid": 0, "children": [{"pid": 2}, {"pid": 3}]})
        );
    }

    #[test]
    fn test_visits_parents_before_children() {
        let mut visited = Vec::new();
        let _ = JsonFilter::new(json!({
            "name": "root",
            "child": {"name": "inner", "grandchild": {"name": "leaf"}}
        }))
        .transform_objects(|obj| {
            if let Some(Value::String(name)) = obj.get("name") {
                visited.push(name.clone());
            }
        });

        assert_eq!(visited, ["root", "inner", "leaf"]);
    }

    #[test]
    fn test_parse_and_serialize_minimal() {
        let filtered = JsonFilter::parse(r#"{ "a": 1,   "b": "two" }"#).unwrap();
        assert_eq!(filtered.to_str(), r#"{"a":1,"b":"two"}"#);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(JsonFilter::parse("not json").is_err());
    }

    #[test]
    fn test_scalar_root_is_untouched() {
        let filtered = JsonFilter::new(json!(42)).transform_objects(zero_pid);
        assert_eq!(filtered.to_str(), "42");
    }
}
