//! Tool catalog prompt builder.
//!
//! Renders the tool-use framing and per-tool descriptors into the system
//! prompt, and owns the stop-sequence side effect: whenever tools are
//! advertised, generation must halt on the invocation block's closing
//! marker so the model never writes past the end of a tool request.

use crate::grammar::{self, TOOL_CALLS_CLOSE, TOOL_CALLS_OPEN};
use tooltalk_core::SchemaTranslator;
use tooltalk_tools::ToolRegistry;

/// How invocation parameters are carried in the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    /// Parameters appear inline as named tag values (buffered loop). The
    /// catalog includes each tool's structural parameter description.
    Inline,
    /// The invocation carries free-text context only; parameters are
    /// recovered later by a secondary model call (streaming loop).
    Deferred,
}

const FRAMING: &str = "In this environment you have access to a set of tools \
you can use to help answer the user's question.\n\n\
To call one or more tools, emit a block with exactly this structure:\n\n";

const TURN_SEMANTICS: &str = "\nYou may place several <invoke> elements inside \
one block. After the block, stop: the results will arrive in a <tool_results> \
block in the next user turn, and you can then continue your answer or call \
more tools.\n\nThe tools available are:\n";

const INLINE_TEMPLATE: &str = "<tool_calls>\n<invoke>\n<tool_name>$TOOL_NAME</tool_name>\n<parameters>\n<$PARAMETER_NAME>$VALUE</$PARAMETER_NAME>\n...\n</parameters>\n</invoke>\n</tool_calls>\n";

const DEFERRED_TEMPLATE: &str = "<tool_calls>\n<invoke>\n<tool_name>$TOOL_NAME</tool_name>\n<context>everything the tool needs to know, in plain prose</context>\n</invoke>\n</tool_calls>\n";

/// Builds the system prompt for a round.
///
/// With no tools registered this is exactly the caller's system text;
/// injecting tool-use framing with nothing to invoke only confuses the
/// model. Otherwise: framing, one descriptor per tool in registration
/// order, and the caller's system text last.
pub fn build_system_prompt(
    registry: &ToolRegistry,
    translator: &dyn SchemaTranslator,
    style: ParameterStyle,
    caller_system: Option<&str>,
) -> String {
    if registry.is_empty() {
        return caller_system.unwrap_or_default().to_string();
    }

    let mut prompt = String::from(FRAMING);
    prompt.push_str(match style {
        ParameterStyle::Inline => INLINE_TEMPLATE,
        ParameterStyle::Deferred => DEFERRED_TEMPLATE,
    });
    prompt.push_str(TURN_SEMANTICS);

    for tool in registry.iter() {
        prompt.push_str("<tool_description>\n<tool_name>");
        prompt.push_str(tool.name());
        prompt.push_str("</tool_name>\n<description>");
        prompt.push_str(tool.description());
        prompt.push_str("</description>\n");
        if style == ParameterStyle::Inline {
            prompt.push_str("<parameters>\n");
            prompt.push_str(&translator.describe(&tool.schema()));
            prompt.push_str("\n</parameters>\n");
        }
        prompt.push_str("</tool_description>\n");
    }

    if let Some(system) = caller_system {
        if !system.is_empty() {
            prompt.push('\n');
            prompt.push_str(system);
        }
    }

    prompt
}

/// Stop sequences to append whenever tools are advertised.
pub fn tool_stop_sequences() -> Vec<String> {
    vec![TOOL_CALLS_CLOSE.to_string()]
}

/// System prompt for the post-tool continuation stream: same framing, plus
/// a directive that forbids any further tool invocation this turn.
pub fn continuation_system_prompt(system_prompt: &str) -> String {
    let mut prompt = system_prompt.to_string();
    if !prompt.is_empty() {
        prompt.push_str("\n\n");
    }
    prompt.push_str(
        "All tool calls for this turn are complete. Do not emit another ",
    );
    prompt.push_str(TOOL_CALLS_OPEN);
    prompt.push_str(" block; answer the user directly using the results you already have.");
    prompt
}

/// Parses the tool names back out of a rendered catalog prompt. Each
/// `<tool_description>` block contributes one name, in order.
pub fn catalog_tool_names(prompt: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = prompt;
    while let Ok(Some((inner, consumed))) = grammar::find_element(cursor, "tool_description") {
        if let Ok(Some((name, _))) = grammar::find_element(inner, "tool_name") {
            names.push(name.trim().to_string());
        }
        cursor = &cursor[consumed..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tooltalk_tools::{FunctionTool, JsonSchemaTranslator, PropertyKind, ToolSchema};

    fn registry_with(names: &[&str]) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for name in names {
            let tool = FunctionTool::builder()
                .name(*name)
                .description(format!("The {name} tool"))
                .schema(
                    ToolSchema::new()
                        .property("query", PropertyKind::String, "Input")
                        .required("query")
                        .build(),
                )
                .execute(|_| async {
                    Ok(tooltalk_core::ToolResponse {
                        result: serde_json::Value::Null,
                    })
                })
                .build()
                .unwrap();
            registry.register(Arc::new(tool)).unwrap();
        }
        registry
    }

    #[test]
    fn test_empty_registry_passthrough() {
        let registry = ToolRegistry::new();
        let translator = JsonSchemaTranslator::new();
        let prompt = build_system_prompt(
            &registry,
            &translator,
            ParameterStyle::Inline,
            Some("You are terse."),
        );
        assert_eq!(prompt, "You are terse.");

        let prompt = build_system_prompt(&registry, &translator, ParameterStyle::Inline, None);
        assert_eq!(prompt, "");
    }

    #[test]
    fn test_catalog_round_trip() {
        let registry = registry_with(&["lookup", "compute", "report"]);
        let translator = JsonSchemaTranslator::new();
        let prompt = build_system_prompt(&registry, &translator, ParameterStyle::Inline, None);

        assert_eq!(catalog_tool_names(&prompt), vec!["lookup", "compute", "report"]);
    }

    #[test]
    fn test_deferred_style_omits_schemas() {
        let registry = registry_with(&["lookup"]);
        let translator = JsonSchemaTranslator::new();
        let prompt = build_system_prompt(&registry, &translator, ParameterStyle::Deferred, None);

        assert!(prompt.contains("<context>"));
        assert!(!prompt.contains("\"properties\""));
    }

    #[test]
    fn test_caller_system_appended_last() {
        let registry = registry_with(&["lookup"]);
        let translator = JsonSchemaTranslator::new();
        let prompt = build_system_prompt(
            &registry,
            &translator,
            ParameterStyle::Inline,
            Some("Speak French."),
        );
        assert!(prompt.ends_with("Speak French."));
    }

    #[test]
    fn test_continuation_prompt_forbids_tools() {
        let prompt = continuation_system_prompt("base");
        assert!(prompt.starts_with("base"));
        assert!(prompt.contains("Do not emit another <tool_calls>"));
    }
}
