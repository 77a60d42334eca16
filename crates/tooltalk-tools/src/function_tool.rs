use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use tooltalk_core::{Result, Tool, ToolResponse};

/// Type alias for tool execution function
pub type ToolFn =
    Box<dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<ToolResponse>> + Send>> + Send + Sync>;

/// A function-based tool implementation
pub struct FunctionTool {
    name: String,
    description: String,
    schema: Value,
    execute_fn: ToolFn,
}

impl FunctionTool {
    pub fn builder() -> FunctionToolBuilder {
        FunctionToolBuilder::new()
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .finish()
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> Value {
        self.schema.clone()
    }

    async fn execute(&self, params: Value) -> Result<ToolResponse> {
        (self.execute_fn)(params).await
    }
}

/// Builder for FunctionTool
pub struct FunctionToolBuilder {
    name: Option<String>,
    description: Option<String>,
    schema: Option<Value>,
    execute_fn: Option<ToolFn>,
}

impl FunctionToolBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            description: None,
            schema: None,
            execute_fn: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn execute<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolResponse>> + Send + 'static,
    {
        self.execute_fn = Some(Box::new(move |params| Box::pin(f(params))));
        self
    }

    pub fn build(self) -> Result<FunctionTool> {
        Ok(FunctionTool {
            name: self.name.ok_or_else(|| {
                tooltalk_core::Error::Other(anyhow::anyhow!("Tool name is required"))
            })?,
            description: self.description.ok_or_else(|| {
                tooltalk_core::Error::Other(anyhow::anyhow!("Tool description is required"))
            })?,
            schema: self.schema.unwrap_or(Value::Null),
            execute_fn: self.execute_fn.ok_or_else(|| {
                tooltalk_core::Error::Other(anyhow::anyhow!("Tool execute function is required"))
            })?,
        })
    }
}

impl Default for FunctionToolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertyKind, ToolSchema};

    #[tokio::test]
    async fn test_function_tool_creation() {
        let schema = ToolSchema::new()
            .property("x", PropertyKind::Number, "First number")
            .property("y", PropertyKind::Number, "Second number")
            .required("x")
            .required("y")
            .build();

        let tool = FunctionTool::builder()
            .name("add")
            .description("Adds two numbers")
            .schema(schema)
            .execute(|params| async move {
                let x = params["x"].as_f64().unwrap_or(0.0);
                let y = params["y"].as_f64().unwrap_or(0.0);

                Ok(ToolResponse {
                    result: serde_json::json!({"sum": x + y}),
                })
            })
            .build()
            .unwrap();

        assert_eq!(tool.name(), "add");
        assert_eq!(tool.description(), "Adds two numbers");

        let params = serde_json::json!({"x": 5.0, "y": 3.0});
        let response = tool.execute(params).await.unwrap();

        assert_eq!(response.result["sum"], 8.0);
    }

    #[test]
    fn test_builder_requires_name() {
        let result = FunctionTool::builder()
            .description("no name")
            .execute(|_| async {
                Ok(ToolResponse {
                    result: Value::Null,
                })
            })
            .build();

        assert!(result.is_err());
    }
}
