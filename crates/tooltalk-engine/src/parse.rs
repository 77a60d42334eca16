//! Invocation block parser.
//!
//! Extracts structured tool-invocation records from free-form assistant
//! text. Plain conversational replies carry no start marker and short-circuit
//! to an empty list; that path is the common case and does a single
//! substring search.

use crate::grammar::{self, TOOL_CALLS_CLOSE, TOOL_CALLS_OPEN};
use tooltalk_core::{Error, Result};

/// One parsed tool invocation. Transient; lives for a single round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool_name: String,
    pub payload: InvocationPayload,
}

/// What the invocation carries alongside the tool name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationPayload {
    /// Named parameter values embedded in the block, in tag order.
    Inline(Vec<(String, String)>),
    /// Free-text context to be resolved into parameters by a secondary
    /// model call.
    Deferred(String),
}

/// Parses all invocations from accumulated assistant text.
///
/// The text usually ends mid-block because the closing marker is a stop
/// sequence; the block is closed canonically before scanning. A single
/// invocation may omit the `<invoke>` wrapper and place its fields directly
/// under `<tool_calls>`; both shapes yield the same one-element list.
pub fn parse_invocations(text: &str) -> Result<Vec<Invocation>> {
    let Some(start) = text.find(TOOL_CALLS_OPEN) else {
        return Ok(Vec::new());
    };
    let rest = &text[start + TOOL_CALLS_OPEN.len()..];
    let body = match rest.find(TOOL_CALLS_CLOSE) {
        Some(end) => &rest[..end],
        None => rest,
    };

    let mut invocations = Vec::new();
    let mut cursor = body;
    while let Some((inner, consumed)) = grammar::find_element(cursor, "invoke")? {
        invocations.push(parse_invoke(inner)?);
        cursor = &cursor[consumed..];
    }

    if invocations.is_empty() {
        // Single-invoke shape without the list wrapper.
        if body.contains("<tool_name>") {
            invocations.push(parse_invoke(body)?);
        } else if body.trim().is_empty() {
            return Err(Error::parse_error("invocation block is empty"));
        } else {
            return Err(Error::parse_error(
                "invocation block contains no <invoke> element",
            ));
        }
    }

    Ok(invocations)
}

fn parse_invoke(inner: &str) -> Result<Invocation> {
    let Some((tool_name, _)) = grammar::find_element(inner, "tool_name")? else {
        return Err(Error::parse_error("invoke element is missing <tool_name>"));
    };
    let tool_name = tool_name.trim().to_string();
    if tool_name.is_empty() {
        return Err(Error::parse_error("invoke element has an empty tool name"));
    }

    let payload = if let Some((params, _)) = grammar::find_element(inner, "parameters")? {
        InvocationPayload::Inline(grammar::child_elements(params)?)
    } else if let Some((context, _)) = grammar::find_element(inner, "context")? {
        InvocationPayload::Deferred(context.trim().to_string())
    } else {
        // A tool with no declared parameters invokes with an empty set.
        InvocationPayload::Inline(Vec::new())
    };

    Ok(Invocation { tool_name, payload })
}
