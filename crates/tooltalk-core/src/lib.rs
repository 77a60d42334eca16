//! Core traits and types for Tooltalk
//!
//! This crate provides the foundational abstractions for text-embedded
//! tool-use orchestration: the conversation message model, the closed
//! stream-event union, and the collaborator traits implemented by callers
//! (tools, the generation provider, the schema translator).

pub mod error;
pub mod event;
pub mod message;
pub mod traits;

// Re-exports
pub use error::{Error, Result};
pub use event::{ProviderEvent, StreamEvent, ToolOutcome};
pub use message::{Message, Role};
pub use traits::{
    ProviderClient, ProviderEventStream, ProviderRequest, ProviderResponse, SchemaTranslator,
    Tool, ToolResponse, ValidationFailure,
};
