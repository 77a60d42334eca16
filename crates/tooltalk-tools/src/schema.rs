use serde_json::Value;

/// Declared type of a tool parameter.
///
/// One vocabulary shared by the schema builder, the validator, and the
/// engine's inline coercer, so a name rendered into a schema always means
/// the same thing when a value is later checked or coerced against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl PropertyKind {
    /// The name written into the schema's `type` field.
    pub fn name(self) -> &'static str {
        match self {
            PropertyKind::String => "string",
            PropertyKind::Number => "number",
            PropertyKind::Integer => "integer",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Array => "array",
            PropertyKind::Object => "object",
        }
    }

    /// Looks a declared `type` name back up. Unknown names return `None`;
    /// callers decide what that means (the validator skips the type check,
    /// the coercer leaves the raw text alone).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(PropertyKind::String),
            "number" => Some(PropertyKind::Number),
            "integer" => Some(PropertyKind::Integer),
            "boolean" => Some(PropertyKind::Boolean),
            "array" => Some(PropertyKind::Array),
            "object" => Some(PropertyKind::Object),
            _ => None,
        }
    }

    /// Whether a candidate JSON value inhabits this kind.
    pub fn admits(self, value: &Value) -> bool {
        match self {
            PropertyKind::String => value.is_string(),
            PropertyKind::Number => value.is_number(),
            PropertyKind::Integer => value.is_i64() || value.is_u64(),
            PropertyKind::Boolean => value.is_boolean(),
            PropertyKind::Array => value.is_array(),
            PropertyKind::Object => value.is_object(),
        }
    }
}

/// Builder for a tool's parameter schema, kept in declaration order until
/// rendered.
#[derive(Debug, Clone, Default)]
pub struct ToolSchema {
    properties: Vec<(String, PropertyKind, String)>,
    required: Vec<String>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(
        mut self,
        name: impl Into<String>,
        kind: PropertyKind,
        description: impl Into<String>,
    ) -> Self {
        self.properties.push((name.into(), kind, description.into()));
        self
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Renders the JSON object schema served by `Tool::schema`.
    pub fn build(self) -> Value {
        let mut properties = serde_json::Map::new();
        for (name, kind, description) in self.properties {
            properties.insert(
                name,
                serde_json::json!({
                    "type": kind.name(),
                    "description": description,
                }),
            );
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names_round_trip() {
        let kinds = [
            PropertyKind::String,
            PropertyKind::Number,
            PropertyKind::Integer,
            PropertyKind::Boolean,
            PropertyKind::Array,
            PropertyKind::Object,
        ];
        for kind in kinds {
            assert_eq!(PropertyKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PropertyKind::from_name("uuid"), None);
    }

    #[test]
    fn test_admits() {
        assert!(PropertyKind::Integer.admits(&json!(3)));
        assert!(!PropertyKind::Integer.admits(&json!(3.5)));
        assert!(PropertyKind::Number.admits(&json!(3.5)));
        assert!(!PropertyKind::String.admits(&json!(true)));
        assert!(PropertyKind::Object.admits(&json!({})));
    }

    #[test]
    fn test_builder_renders_object_schema() {
        let schema = ToolSchema::new()
            .property("query", PropertyKind::String, "Search query")
            .property("limit", PropertyKind::Integer, "Max results")
            .required("query")
            .build();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["query"]["type"], "string");
        assert_eq!(schema["properties"]["query"]["description"], "Search query");
        assert_eq!(schema["properties"]["limit"]["type"], "integer");
        assert_eq!(schema["required"], json!(["query"]));
    }
}
