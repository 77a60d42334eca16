//! Tool system for Tooltalk
//!
//! This crate provides the tool-side building blocks, including:
//! - Function tools with builder-based construction
//! - The parameter schema builder and its property-kind vocabulary
//! - The registration-ordered tool registry
//! - The default schema translator used for prompting and validation
//! - Built-in tools (echo)

pub mod builtin;
pub mod function_tool;
pub mod registry;
pub mod schema;
pub mod translator;

// Re-exports
pub use function_tool::FunctionTool;
pub use registry::ToolRegistry;
pub use schema::{PropertyKind, ToolSchema};
pub use translator::JsonSchemaTranslator;

// Re-export core types
pub use tooltalk_core::{Result, SchemaTranslator, Tool, ToolResponse, ValidationFailure};
