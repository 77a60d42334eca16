//! Tool executor.
//!
//! One bounded call per invocation: no timeout, no retry. Failure handling
//! belongs to the loop above; here a rejection simply becomes the error
//! side of the outcome.

use serde_json::Value;
use std::sync::Arc;
use tooltalk_core::{Tool, ToolOutcome};

/// Calls the tool exactly once with already-validated parameters.
pub async fn execute_tool(tool: &Arc<dyn Tool>, params: Value) -> ToolOutcome {
    tracing::debug!(tool_name = %tool.name(), "Executing tool");

    match tool.execute(params).await {
        Ok(response) => ToolOutcome::Data {
            tool_name: tool.name().to_string(),
            data: response.result,
        },
        Err(e) => {
            tracing::warn!(tool_name = %tool.name(), error = %e, "Tool execution failed");
            ToolOutcome::Failure {
                tool_name: tool.name().to_string(),
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tooltalk_core::ToolResponse;
    use tooltalk_tools::FunctionTool;

    #[tokio::test]
    async fn test_success_and_failure_outcomes() {
        let ok: Arc<dyn Tool> = Arc::new(
            FunctionTool::builder()
                .name("ok")
                .description("always succeeds")
                .execute(|_| async {
                    Ok(ToolResponse {
                        result: serde_json::json!({"fine": true}),
                    })
                })
                .build()
                .unwrap(),
        );
        let outcome = execute_tool(&ok, Value::Null).await;
        assert_eq!(
            outcome,
            ToolOutcome::Data {
                tool_name: "ok".to_string(),
                data: serde_json::json!({"fine": true}),
            }
        );

        let bad: Arc<dyn Tool> = Arc::new(
            FunctionTool::builder()
                .name("bad")
                .description("always fails")
                .execute(|_| async {
                    Err(tooltalk_core::Error::Other(anyhow::anyhow!("boom")))
                })
                .build()
                .unwrap(),
        );
        let outcome = execute_tool(&bad, Value::Null).await;
        assert!(outcome.is_failure());
        assert_eq!(outcome.tool_name(), "bad");
    }
}
