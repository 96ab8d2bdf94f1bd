//! Strict JSON schemas for structured output, derived with `schemars`.
//!
//! Strict mode on OpenAI-compatible endpoints wants every object closed
//! (`additionalProperties: false`), every property listed in `required`
//! and no `$ref` indirection. [`StructuredOutput::strict_schema`] rewrites
//! the `schemars` output into that shape.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Types that can be requested as structured model output.
///
/// Blanket-implemented for anything `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Strict-mode schema for `Self`.
    fn strict_schema() -> Value {
        let mut value = serde_json::to_value(schema_for!(Self)).unwrap_or_default();

        let definitions = match &mut value {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("definitions")
            }
            _ => None,
        };

        if let Some(Value::Object(defs)) = definitions {
            inline_refs(&mut value, &defs);
        }
        close_objects(&mut value);

        value
    }

    /// Name sent as the `json_schema.name` field.
    fn output_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn inline_refs(value: &mut Value, definitions: &Map<String, Value>) {
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix("#/definitions/"))
                .and_then(|name| definitions.get(name))
                .cloned();

            if let Some(def) = target {
                *value = def;
                inline_refs(value, definitions);
                return;
            }

            for v in map.values_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                let keys: Option<Vec<Value>> = map
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().map(Value::String).collect());
                if let Some(keys) = keys {
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }

            for v in map.values_mut() {
                close_objects(v);
            }
        }
        Value::Array(items) => {
            for item in items {
                close_objects(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct Annotation {
        step_annotation: String,
        note: Option<String>,
    }

    #[derive(Deserialize, JsonSchema)]
    struct Nested {
        annotation: Annotation,
        tags: Vec<String>,
    }

    #[test]
    fn test_all_properties_required() {
        let schema = Annotation::strict_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();

        assert!(required.contains(&"step_annotation"));
        assert!(required.contains(&"note"), "Option fields must still be required");
        assert_eq!(schema["additionalProperties"], Value::Bool(false));
    }

    #[test]
    fn test_nested_refs_are_inlined() {
        let schema = Nested::strict_schema();
        let text = serde_json::to_string(&schema).unwrap();

        assert!(!text.contains("$ref"));
        assert!(schema.get("definitions").is_none());
        assert!(schema.get("$schema").is_none());

        let inner = &schema["properties"]["annotation"];
        assert_eq!(inner["type"], "object");
        assert_eq!(inner["additionalProperties"], Value::Bool(false));
    }
}
