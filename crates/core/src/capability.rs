//! Capabilities: the invocable functions an assistant may call.
//!
//! A [`CapabilityDescriptor`] is what the registry hands us: a name, a
//! description and a JSON Schema for the parameters. A [`CapabilityEntry`]
//! is a descriptor selected for one request, with a synthesized example
//! invocation and its relevance score.

use serde::{Deserialize, Serialize};

/// A capability as supplied by an external registry.
///
/// Every field defaults when absent so that one malformed registry entry
/// deserializes (and is later skipped) instead of failing the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// The capability name, unique within a universe.
    #[serde(default)]
    pub name: String,

    /// Description of what the capability does (sent to the model).
    #[serde(default)]
    pub description: String,

    /// JSON Schema describing the parameters.
    #[serde(default = "empty_schema")]
    pub parameters: serde_json::Value,
}

fn empty_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl CapabilityDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Names listed under the schema's `required` array, in schema order.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(serde_json::Value::as_array)
            .map(|names| names.iter().filter_map(serde_json::Value::as_str).collect())
            .unwrap_or_default()
    }

    /// The declared JSON type of one parameter.
    ///
    /// Union types such as `["string", "null"]` resolve to their first
    /// non-null member.
    pub fn parameter_type(&self, name: &str) -> Option<&str> {
        let declared = self.parameters.get("properties")?.get(name)?.get("type")?;
        match declared {
            serde_json::Value::String(kind) => Some(kind.as_str()),
            serde_json::Value::Array(kinds) => kinds
                .iter()
                .filter_map(serde_json::Value::as_str)
                .find(|kind| *kind != "null"),
            _ => None,
        }
    }
}

/// A capability selected for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityEntry {
    name: String,
    schema: CapabilityDescriptor,
    /// Sample arguments: every required parameter mapped to a placeholder.
    example: serde_json::Value,
    score: f32,
}

impl CapabilityEntry {
    pub fn new(schema: CapabilityDescriptor, example: serde_json::Value) -> Self {
        Self {
            name: schema.name.clone(),
            schema,
            example,
            score: 0.0,
        }
    }

    /// Return a copy of this entry carrying `score`.
    pub fn with_score(self, score: f32) -> Self {
        Self { score, ..self }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &CapabilityDescriptor {
        &self.schema
    }

    pub fn description(&self) -> &str {
        &self.schema.description
    }

    pub fn example(&self) -> &serde_json::Value {
        &self.example
    }

    pub fn score(&self) -> f32 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grep_descriptor() -> CapabilityDescriptor {
        CapabilityDescriptor::new(
            "grep",
            "Search file contents",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "pattern": { "type": "string" },
                    "max_results": { "type": ["integer", "null"] }
                },
                "required": ["pattern", "max_results"]
            }),
        )
    }

    #[test]
    fn required_parameters_in_schema_order() {
        assert_eq!(grep_descriptor().required_parameters(), vec!["pattern", "max_results"]);
    }

    #[test]
    fn union_type_resolves_to_non_null() {
        let descriptor = grep_descriptor();
        assert_eq!(descriptor.parameter_type("max_results"), Some("integer"));
        assert_eq!(descriptor.parameter_type("pattern"), Some("string"));
        assert_eq!(descriptor.parameter_type("missing"), None);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let descriptor: CapabilityDescriptor =
            serde_json::from_str(r#"{"description": "no name here"}"#).unwrap();
        assert!(descriptor.name.is_empty());
        assert!(descriptor.required_parameters().is_empty());
    }
}
