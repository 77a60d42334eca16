use crate::{FunctionTool, PropertyKind, ToolSchema};
use tooltalk_core::{Error, Result, ToolResponse};

/// Creates an echo tool for testing purposes
pub fn create_echo_tool() -> Result<FunctionTool> {
    let schema = ToolSchema::new()
        .property("message", PropertyKind::String, "Message to echo back")
        .required("message")
        .build();

    FunctionTool::builder()
        .name("echo")
        .description("Echoes back the provided message. Useful for testing tool execution.")
        .schema(schema)
        .execute(|params| async move {
            let message = params["message"]
                .as_str()
                .ok_or_else(|| Error::Other(anyhow::anyhow!("Missing 'message' parameter")))?;

            tracing::debug!(message = %message, "Echo tool called");

            Ok(ToolResponse {
                result: serde_json::json!({ "message": message }),
            })
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tooltalk_core::Tool;

    #[tokio::test]
    async fn test_echo_tool() {
        let tool = create_echo_tool().unwrap();

        assert_eq!(tool.name(), "echo");

        let params = serde_json::json!({"message": "Hello, World!"});
        let response = tool.execute(params).await.unwrap();

        assert_eq!(response.result["message"], "Hello, World!");
    }
}
