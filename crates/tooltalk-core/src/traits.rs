use super::{Message, ProviderEvent, Result};
use async_trait::async_trait;
use futures::stream::Stream;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Tool trait - abstraction for callable tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the name of the tool
    fn name(&self) -> &str;

    /// Returns a description of what the tool does
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's parameters
    fn schema(&self) -> Value;

    /// Executes the tool with validated parameters
    async fn execute(&self, params: Value) -> Result<ToolResponse>;
}

/// Tool execution response
#[derive(Debug, Clone)]
pub struct ToolResponse {
    pub result: Value,
}

/// Boxed stream of provider lifecycle events.
pub type ProviderEventStream = Box<dyn Stream<Item = Result<ProviderEvent>> + Send + Unpin>;

/// Request to the generation provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub stop_sequences: Vec<String>,
    pub max_tokens: Option<u32>,
}

/// Buffered response from the generation provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub content: String,
    pub stop_reason: Option<String>,
}

/// ProviderClient trait - abstraction over the generation backend.
///
/// Implementations own transport and authentication. The engine never
/// retries or rate-limits through this seam; it issues one request per
/// round and one secondary request per deferred parameter resolution.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Returns the provider's name, for logging
    fn name(&self) -> &str;

    /// Issues one buffered generation request
    async fn create_response(&self, request: ProviderRequest) -> Result<ProviderResponse>;

    /// Opens one streaming generation request.
    ///
    /// The implementation must stop producing events and release the
    /// underlying transport once `cancel` is triggered.
    async fn create_streaming_response(
        &self,
        request: ProviderRequest,
        cancel: CancellationToken,
    ) -> Result<ProviderEventStream>;
}

/// Problems reported by schema validation, one entry per violation.
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    pub problems: Vec<String>,
}

impl ValidationFailure {
    pub fn new(problems: Vec<String>) -> Self {
        Self { problems }
    }
}

/// SchemaTranslator trait - turns parameter schemas into prompt text and
/// validates candidate parameter values against them.
pub trait SchemaTranslator: Send + Sync {
    /// Renders a structural description of the schema usable in a prompt
    fn describe(&self, schema: &Value) -> String;

    /// Validates a candidate value, returning the (possibly normalized)
    /// value on success
    fn validate(&self, schema: &Value, value: &Value)
    -> std::result::Result<Value, ValidationFailure>;
}
