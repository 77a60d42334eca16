use super::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Low-level lifecycle event from the generation provider's delta stream.
///
/// Content arrives as text deltas keyed by content-block index; the
/// orchestrator reassembles blocks in index order. These events are
/// re-emitted unchanged to stream consumers so a tool-free stream and a
/// tool-bearing stream look identical at the provider level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderEvent {
    MessageStart,
    ContentBlockStart { index: u32 },
    ContentBlockDelta { index: u32, text: String },
    ContentBlockStop { index: u32 },
    MessageStop,
}

/// Outcome of one tool invocation within a round.
///
/// Exactly one of the two sides applies: a tool either produced a value or
/// failed with an error. Outcomes are transient; they live for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Data { tool_name: String, data: Value },
    Failure { tool_name: String, error: String },
}

impl ToolOutcome {
    pub fn tool_name(&self) -> &str {
        match self {
            ToolOutcome::Data { tool_name, .. } => tool_name,
            ToolOutcome::Failure { tool_name, .. } => tool_name,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ToolOutcome::Failure { .. })
    }
}

/// Event yielded by the streaming orchestrator.
///
/// A closed union over the provider lifecycle events plus the protocol
/// variants, so consumers can match exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A raw provider event, forwarded unchanged.
    Provider(ProviderEvent),
    /// A tool invocation was parsed and is about to be resolved.
    ToolInvoke { tool_name: String },
    /// Neutral progress tick while the invocation's parameters are being
    /// recovered via the secondary model call.
    ToolCall { tool_name: String },
    /// The tool ran and returned a value.
    ToolResult { tool_name: String, data: Value },
    /// Parameter resolution or execution failed for this tool.
    ToolError { tool_name: String, error: String },
    /// End of the tool round: all outcomes plus the synthesized feedback
    /// turn that was appended to the transcript.
    ToolResults {
        outcomes: Vec<ToolOutcome>,
        follow_up: Message,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let ok = ToolOutcome::Data {
            tool_name: "lookup".to_string(),
            data: serde_json::json!({"hits": 3}),
        };
        assert_eq!(ok.tool_name(), "lookup");
        assert!(!ok.is_failure());

        let err = ToolOutcome::Failure {
            tool_name: "compute".to_string(),
            error: "division by zero".to_string(),
        };
        assert!(err.is_failure());
    }

    #[test]
    fn test_stream_event_tagging() {
        let ev = StreamEvent::ToolInvoke {
            tool_name: "lookup".to_string(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "tool_invoke");

        let ev = StreamEvent::Provider(ProviderEvent::ContentBlockDelta {
            index: 0,
            text: "hi".to_string(),
        });
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "provider");
        assert_eq!(json["type"], "content_block_delta");
    }
}
