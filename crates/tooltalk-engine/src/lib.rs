//! Tool-use orchestration engine for Tooltalk
//!
//! Lets a text-generation model invoke registered tools mid-conversation
//! through a plain-text sub-grammar embedded in its output, with no native
//! function-calling API: the engine advertises tools in the system prompt,
//! parses invocation blocks out of replies, resolves and validates
//! parameters, executes tools sequentially, and feeds results back until
//! the model stops asking.
//!
//! Two entry points:
//! - [`TurnLoop`]: buffered request/response orchestration.
//! - [`StreamingSession`]: incremental orchestration emitting
//!   [`StreamEvent`](tooltalk_core::StreamEvent)s, including per-tool
//!   lifecycle events and one continuation stream for the final reply.

pub mod execute;
pub mod feedback;
pub mod grammar;
pub mod parse;
pub mod prompt;
pub mod resolve;
pub mod stream_loop;
pub mod testing;
pub mod turn_loop;

// Re-exports
pub use execute::execute_tool;
pub use feedback::ResultBlockBuilder;
pub use grammar::{TOOL_CALLS_CLOSE, TOOL_CALLS_OPEN, TOOL_RESULTS_CLOSE, TOOL_RESULTS_OPEN};
pub use parse::{Invocation, InvocationPayload, parse_invocations};
pub use prompt::{
    ParameterStyle, build_system_prompt, catalog_tool_names, continuation_system_prompt,
    tool_stop_sequences,
};
pub use resolve::{ResolutionEvent, resolution_stream, resolve_inline};
pub use stream_loop::{EventStream, StreamingSession, StreamingSessionBuilder};
pub use turn_loop::{DEFAULT_MAX_ROUNDS, Orchestration, TurnLoop, TurnLoopBuilder};

// Re-export core types
pub use tooltalk_core::{
    Error, Message, ProviderClient, ProviderEvent, ProviderRequest, ProviderResponse, Result, Role,
    SchemaTranslator, StreamEvent, Tool, ToolOutcome, ToolResponse,
};
