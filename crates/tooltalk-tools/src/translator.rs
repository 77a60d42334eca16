use crate::schema::PropertyKind;
use serde_json::Value;
use tooltalk_core::{SchemaTranslator, ValidationFailure};

/// Default schema translator for plain JSON-schema-style object schemas.
///
/// `describe` renders the schema as pretty-printed JSON for inclusion in
/// the catalog prompt and the secondary resolution prompt. `validate`
/// checks the shape a tool schema built with [`ToolSchema`](crate::ToolSchema)
/// declares: an object value, all `required` names present, and every
/// supplied property matching its declared `type`.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaTranslator;

impl JsonSchemaTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaTranslator for JsonSchemaTranslator {
    fn describe(&self, schema: &Value) -> String {
        serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string())
    }

    fn validate(
        &self,
        schema: &Value,
        value: &Value,
    ) -> std::result::Result<Value, ValidationFailure> {
        // A null schema opts out of validation entirely.
        if schema.is_null() {
            return Ok(value.clone());
        }

        let mut problems = Vec::new();

        let Some(object) = value.as_object() else {
            return Err(ValidationFailure::new(vec![format!(
                "expected an object of parameters, got {value}"
            )]));
        };

        let properties = schema
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(name) {
                    problems.push(format!("missing required parameter '{name}'"));
                }
            }
        }

        for (name, supplied) in object {
            match properties.get(name) {
                Some(spec) => {
                    // Unknown declared types are not our contract to enforce
                    if let Some(kind) = spec
                        .get("type")
                        .and_then(Value::as_str)
                        .and_then(PropertyKind::from_name)
                    {
                        if !kind.admits(supplied) {
                            problems.push(format!(
                                "parameter '{name}' should be of type {declared}, got {supplied}",
                                declared = kind.name()
                            ));
                        }
                    }
                }
                None => problems.push(format!("unknown parameter '{name}'")),
            }
        }

        if problems.is_empty() {
            Ok(value.clone())
        } else {
            Err(ValidationFailure::new(problems))
        }
    }
}
