//! Result block builder.
//!
//! Accumulates the round's outcomes into the `<tool_results>` block fed
//! back to the model as a new user turn. The first failure resets the
//! accumulator: the serialized block carries only the error fragment, even
//! though earlier successes were already reported to the caller as events.

use crate::grammar::{TOOL_RESULTS_CLOSE, TOOL_RESULTS_OPEN};
use tooltalk_core::{Message, ToolOutcome};

#[derive(Debug)]
pub struct ResultBlockBuilder {
    fragments: Vec<String>,
    open: bool,
}

impl Default for ResultBlockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultBlockBuilder {
    pub fn new() -> Self {
        Self {
            fragments: Vec::new(),
            open: true,
        }
    }

    /// Accumulates one outcome. Returns `false` once the round must stop:
    /// after the first failure, queued invocations are not executed and
    /// further pushes are ignored.
    pub fn push(&mut self, outcome: &ToolOutcome) -> bool {
        if !self.open {
            return false;
        }
        match outcome {
            ToolOutcome::Data { tool_name, data } => {
                self.fragments.push(format!(
                    "<result><tool_name>{tool_name}</tool_name><output>{data}</output></result>"
                ));
                true
            }
            ToolOutcome::Failure { tool_name, error } => {
                self.fragments.clear();
                self.fragments.push(format!(
                    "<error><tool_name>{tool_name}</tool_name><message>{error}</message></error>"
                ));
                self.open = false;
                false
            }
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{TOOL_RESULTS_OPEN}\n{}\n{TOOL_RESULTS_CLOSE}",
            self.fragments.join("\n")
        )
    }

    /// Finishes the block as the user turn appended to the transcript.
    pub fn into_message(self) -> Message {
        Message::user(self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(name: &str) -> ToolOutcome {
        ToolOutcome::Data {
            tool_name: name.to_string(),
            data: serde_json::json!({"v": name}),
        }
    }

    #[test]
    fn test_success_fragments_accumulate() {
        let mut builder = ResultBlockBuilder::new();
        assert!(builder.push(&data("lookup")));
        assert!(builder.push(&data("compute")));

        let block = builder.render();
        assert!(block.starts_with(TOOL_RESULTS_OPEN));
        assert!(block.ends_with(TOOL_RESULTS_CLOSE));
        assert!(block.contains("<tool_name>lookup</tool_name>"));
        assert!(block.contains("<tool_name>compute</tool_name>"));
    }

    #[test]
    fn test_failure_resets_and_closes() {
        let mut builder = ResultBlockBuilder::new();
        assert!(builder.push(&data("lookup")));
        assert!(!builder.push(&ToolOutcome::Failure {
            tool_name: "compute".to_string(),
            error: "division by zero".to_string(),
        }));
        // Ignored after the failure
        assert!(!builder.push(&data("report")));

        let block = builder.render();
        assert!(!block.contains("lookup"));
        assert!(!block.contains("report"));
        assert!(block.contains("<error><tool_name>compute</tool_name>"));
        assert!(block.contains("division by zero"));
    }

    #[test]
    fn test_into_message_is_user_turn() {
        let mut builder = ResultBlockBuilder::new();
        builder.push(&data("lookup"));
        let message = builder.into_message();
        assert_eq!(message.role, tooltalk_core::Role::User);
        assert!(message.content.contains("<result>"));
    }
}
