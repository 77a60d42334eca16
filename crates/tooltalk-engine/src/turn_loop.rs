//! Buffered turn loop.
//!
//! Drives repeated request, parse, execute, feedback cycles against the
//! provider until a reply arrives with no invocation block.

use crate::execute::execute_tool;
use crate::feedback::ResultBlockBuilder;
use crate::parse::{InvocationPayload, parse_invocations};
use crate::prompt::{ParameterStyle, build_system_prompt, tool_stop_sequences};
use crate::resolve::resolve_inline;
use std::sync::Arc;
use tooltalk_core::{
    Error, Message, ProviderClient, ProviderRequest, Result, SchemaTranslator, ToolOutcome,
};
use tooltalk_tools::{JsonSchemaTranslator, ToolRegistry};
use uuid::Uuid;

/// Rounds allowed per call before the loop gives up. A confused model can
/// request tools forever; the budget turns that into a deterministic error.
pub const DEFAULT_MAX_ROUNDS: usize = 8;

/// Result of one buffered orchestration call.
#[derive(Debug, Clone)]
pub struct Orchestration {
    /// The assistant reply that ended the loop.
    pub final_response: Message,
    /// The whole transcript: caller input plus every appended turn.
    pub full_messages: Vec<Message>,
    /// The transcript with protocol-control turns (invocation replies and
    /// result blocks) removed.
    pub filtered_messages: Vec<Message>,
}

pub struct TurnLoop {
    provider: Arc<dyn ProviderClient>,
    registry: Arc<ToolRegistry>,
    translator: Arc<dyn SchemaTranslator>,
    model: String,
    system: Option<String>,
    max_rounds: usize,
}

impl TurnLoop {
    pub fn builder() -> TurnLoopBuilder {
        TurnLoopBuilder::new()
    }

    /// Runs the loop over the caller's transcript.
    ///
    /// Fatal conditions (an invocation naming an unregistered tool, a
    /// malformed block, an exhausted round budget) abort the whole call.
    /// Per-tool failures instead truncate the round's result block and are
    /// fed back so the model can react.
    pub async fn run(&self, messages: Vec<Message>) -> Result<Orchestration> {
        let invocation_id = Uuid::new_v4().to_string();
        let system_prompt = build_system_prompt(
            &self.registry,
            self.translator.as_ref(),
            ParameterStyle::Inline,
            self.system.as_deref(),
        );
        let stop_sequences = if self.registry.is_empty() {
            Vec::new()
        } else {
            tool_stop_sequences()
        };

        let mut transcript = messages;
        let mut protocol_turns: Vec<usize> = Vec::new();

        tracing::info!(
            invocation_id = %invocation_id,
            model = %self.model,
            tools = self.registry.len(),
            "Starting buffered orchestration"
        );

        for round in 0..self.max_rounds {
            tracing::debug!(
                invocation_id = %invocation_id,
                round = round,
                "Requesting model reply"
            );

            let response = self
                .provider
                .create_response(ProviderRequest {
                    model: self.model.clone(),
                    system: (!system_prompt.is_empty()).then(|| system_prompt.clone()),
                    messages: transcript.clone(),
                    stop_sequences: stop_sequences.clone(),
                    max_tokens: None,
                })
                .await?;

            transcript.push(Message::assistant(response.content.clone()));

            let invocations = parse_invocations(&response.content)?;
            if invocations.is_empty() {
                tracing::info!(
                    invocation_id = %invocation_id,
                    rounds = round + 1,
                    "Orchestration completed"
                );
                let final_response = transcript.last().cloned().unwrap_or_else(|| {
                    Message::assistant(String::new())
                });
                let filtered_messages = transcript
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !protocol_turns.contains(i))
                    .map(|(_, m)| m.clone())
                    .collect();
                return Ok(Orchestration {
                    final_response,
                    full_messages: transcript,
                    filtered_messages,
                });
            }

            // The invoking reply and the result block are protocol turns.
            protocol_turns.push(transcript.len() - 1);

            let mut builder = ResultBlockBuilder::new();
            for invocation in &invocations {
                let tool = self
                    .registry
                    .get(&invocation.tool_name)
                    .ok_or_else(|| Error::ToolNotFound(invocation.tool_name.clone()))?;

                let outcome = match &invocation.payload {
                    InvocationPayload::Inline(params) => {
                        match resolve_inline(tool, self.translator.as_ref(), params) {
                            Ok(value) => execute_tool(tool, value).await,
                            Err(e) => ToolOutcome::Failure {
                                tool_name: invocation.tool_name.clone(),
                                error: e.to_string(),
                            },
                        }
                    }
                    // The buffered prompt asks for inline parameters; a
                    // context payload here means the model ignored it.
                    InvocationPayload::Deferred(_) => ToolOutcome::Failure {
                        tool_name: invocation.tool_name.clone(),
                        error: "invocation carried free-text context instead of parameters"
                            .to_string(),
                    },
                };

                if !builder.push(&outcome) {
                    break;
                }
            }

            transcript.push(builder.into_message());
            protocol_turns.push(transcript.len() - 1);
        }

        tracing::warn!(
            invocation_id = %invocation_id,
            rounds = self.max_rounds,
            "Round budget exhausted"
        );
        Err(Error::RoundBudgetExceeded {
            rounds: self.max_rounds,
        })
    }
}

pub struct TurnLoopBuilder {
    provider: Option<Arc<dyn ProviderClient>>,
    registry: Option<Arc<ToolRegistry>>,
    translator: Option<Arc<dyn SchemaTranslator>>,
    model: Option<String>,
    system: Option<String>,
    max_rounds: usize,
}

impl TurnLoopBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            registry: None,
            translator: None,
            model: None,
            system: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn provider(mut self, provider: Arc<dyn ProviderClient>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn SchemaTranslator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn build(self) -> Result<TurnLoop> {
        Ok(TurnLoop {
            provider: self
                .provider
                .ok_or_else(|| Error::Other(anyhow::anyhow!("Provider is required")))?,
            registry: self
                .registry
                .ok_or_else(|| Error::Other(anyhow::anyhow!("Tool registry is required")))?,
            translator: self
                .translator
                .unwrap_or_else(|| Arc::new(JsonSchemaTranslator::new())),
            model: self
                .model
                .ok_or_else(|| Error::Other(anyhow::anyhow!("Model id is required")))?,
            system: self.system,
            max_rounds: self.max_rounds,
        })
    }
}

impl Default for TurnLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
