//! Streaming orchestrator.
//!
//! Incremental counterpart of the buffered loop: consumes one live provider
//! stream, re-emits every lifecycle event while reassembling text, runs the
//! parse/resolve/execute/feedback pipeline once the reply is complete, and
//! opens exactly one continuation stream for the model's final answer.

use crate::execute::execute_tool;
use crate::feedback::ResultBlockBuilder;
use crate::parse::{InvocationPayload, parse_invocations};
use crate::prompt::{
    ParameterStyle, build_system_prompt, continuation_system_prompt, tool_stop_sequences,
};
use crate::resolve::{ResolutionEvent, resolution_stream, resolve_inline};
use async_stream::stream;
use futures::stream::{Stream, StreamExt};
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tooltalk_core::{
    Error, Message, ProviderClient, ProviderEvent, ProviderRequest, Result, SchemaTranslator,
    StreamEvent, ToolOutcome,
};
use tooltalk_tools::{JsonSchemaTranslator, ToolRegistry};
use uuid::Uuid;

/// Consumer-facing event stream. Single-pass, single-consumer.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Consumption state of a session's event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    NotStarted,
    Consuming,
    Done,
}

/// Marks the session Done on every exit path of the stream body:
/// completion, fault, cancellation, or the consumer dropping the stream.
struct StateGuard(Arc<Mutex<StreamState>>);

impl Drop for StateGuard {
    fn drop(&mut self) {
        if let Ok(mut state) = self.0.lock() {
            *state = StreamState::Done;
        }
    }
}

/// One streaming orchestration call over a fixed input transcript.
///
/// [`events`](StreamingSession::events) hands out the event sequence once;
/// asking again is a usage error surfaced synchronously. Cancellation is
/// cooperative via [`cancellation_token`](StreamingSession::cancellation_token):
/// triggering it ends the sequence without error and aborts whichever
/// provider stream (outer, resolution, or continuation) is currently open.
pub struct StreamingSession {
    provider: Arc<dyn ProviderClient>,
    registry: Arc<ToolRegistry>,
    translator: Arc<dyn SchemaTranslator>,
    model: String,
    resolver_model: Option<String>,
    system: Option<String>,
    messages: Vec<Message>,
    state: Arc<Mutex<StreamState>>,
    cancel: CancellationToken,
}

impl StreamingSession {
    pub fn builder() -> StreamingSessionBuilder {
        StreamingSessionBuilder::new()
    }

    /// Handle for aborting the call. Clone freely.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Takes the single-pass event stream.
    ///
    /// Returns [`Error::StreamConsumed`] on every call after the first;
    /// the guard is the `NotStarted -> Consuming` transition precondition.
    pub fn events(&self) -> Result<EventStream> {
        {
            let mut state = self.state.lock().map_err(|_| Error::StreamConsumed)?;
            if *state != StreamState::NotStarted {
                return Err(Error::StreamConsumed);
            }
            *state = StreamState::Consuming;
        }

        let provider = self.provider.clone();
        let registry = self.registry.clone();
        let translator = self.translator.clone();
        let model = self.model.clone();
        let resolver_model = self
            .resolver_model
            .clone()
            .unwrap_or_else(|| self.model.clone());
        let system = self.system.clone();
        let mut transcript = self.messages.clone();
        let state = self.state.clone();
        let cancel = self.cancel.clone();

        Ok(Box::pin(stream! {
            let _state_guard = StateGuard(state);
            // Child token: cancelled by the caller's token, and by the
            // drop guard whenever this generator is dropped, so no
            // provider stream outlives the consumer.
            let child = cancel.child_token();
            let _cancel_guard = child.clone().drop_guard();

            let invocation_id = Uuid::new_v4().to_string();
            let system_prompt = build_system_prompt(
                &registry,
                translator.as_ref(),
                ParameterStyle::Deferred,
                system.as_deref(),
            );
            let stop_sequences = if registry.is_empty() {
                Vec::new()
            } else {
                tool_stop_sequences()
            };

            tracing::info!(
                invocation_id = %invocation_id,
                model = %model,
                tools = registry.len(),
                "Starting streaming orchestration"
            );

            let request = ProviderRequest {
                model: model.clone(),
                system: (!system_prompt.is_empty()).then(|| system_prompt.clone()),
                messages: transcript.clone(),
                stop_sequences,
                max_tokens: None,
            };
            let mut deltas = match provider
                .create_streaming_response(request, child.clone())
                .await
            {
                Ok(s) => s,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            // Reassemble text per content-block index while forwarding the
            // raw events, so a tool-free stream looks identical to one
            // produced without this orchestrator in the middle.
            let mut blocks: BTreeMap<u32, String> = BTreeMap::new();
            loop {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => return,
                    next = deltas.next() => match next {
                        Some(Ok(event)) => {
                            if let ProviderEvent::ContentBlockDelta { index, text } = &event {
                                blocks.entry(*index).or_default().push_str(text);
                            }
                            yield Ok(StreamEvent::Provider(event));
                        }
                        Some(Err(e)) => {
                            yield Err(e);
                            return;
                        }
                        None => break,
                    },
                }
            }
            drop(deltas);

            let assistant_text: String = blocks.into_values().collect();
            let invocations = match parse_invocations(&assistant_text) {
                Ok(v) => v,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            if invocations.is_empty() {
                return;
            }

            transcript.push(Message::assistant(assistant_text));

            let mut builder = ResultBlockBuilder::new();
            let mut outcomes: Vec<ToolOutcome> = Vec::new();
            let mut executed = 0usize;

            for invocation in invocations {
                let Some(tool) = registry.get(&invocation.tool_name).cloned() else {
                    yield Err(Error::ToolNotFound(invocation.tool_name));
                    return;
                };

                yield Ok(StreamEvent::ToolInvoke {
                    tool_name: invocation.tool_name.clone(),
                });

                let params = match invocation.payload {
                    InvocationPayload::Deferred(context) => {
                        let resolution = resolution_stream(
                            provider.clone(),
                            translator.clone(),
                            tool.clone(),
                            resolver_model.clone(),
                            context,
                            child.clone(),
                        );
                        tokio::pin!(resolution);

                        let mut resolved: Option<Result<serde_json::Value>> = None;
                        while let Some(event) = resolution.next().await {
                            match event {
                                ResolutionEvent::Progress => {
                                    yield Ok(StreamEvent::ToolCall {
                                        tool_name: invocation.tool_name.clone(),
                                    });
                                }
                                ResolutionEvent::Resolved(result) => resolved = Some(result),
                            }
                        }
                        match resolved {
                            Some(result) => result,
                            // The resolution stream ended without a
                            // terminal event: it was cancelled.
                            None => return,
                        }
                    }
                    InvocationPayload::Inline(params) => {
                        resolve_inline(&tool, translator.as_ref(), &params)
                    }
                };

                let outcome = match params {
                    Ok(value) => {
                        executed += 1;
                        execute_tool(&tool, value).await
                    }
                    Err(e) => ToolOutcome::Failure {
                        tool_name: invocation.tool_name.clone(),
                        error: e.to_string(),
                    },
                };

                match &outcome {
                    ToolOutcome::Data { tool_name, data } => {
                        yield Ok(StreamEvent::ToolResult {
                            tool_name: tool_name.clone(),
                            data: data.clone(),
                        });
                    }
                    ToolOutcome::Failure { tool_name, error } => {
                        yield Ok(StreamEvent::ToolError {
                            tool_name: tool_name.clone(),
                            error: error.clone(),
                        });
                    }
                }

                let keep_going = builder.push(&outcome);
                outcomes.push(outcome);
                if !keep_going {
                    break;
                }
            }

            let follow_up = builder.into_message();
            transcript.push(follow_up.clone());
            yield Ok(StreamEvent::ToolResults { outcomes, follow_up });

            if executed == 0 {
                return;
            }

            // One continuation stream for the final reply; no recursion
            // into further tool rounds.
            tracing::debug!(invocation_id = %invocation_id, "Opening continuation stream");
            let request = ProviderRequest {
                model,
                system: Some(continuation_system_prompt(&system_prompt)),
                messages: transcript,
                stop_sequences: Vec::new(),
                max_tokens: None,
            };
            let mut continuation = match provider
                .create_streaming_response(request, child.clone())
                .await
            {
                Ok(s) => s,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            loop {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => return,
                    next = continuation.next() => match next {
                        Some(Ok(event)) => yield Ok(StreamEvent::Provider(event)),
                        Some(Err(e)) => {
                            yield Err(e);
                            return;
                        }
                        None => break,
                    },
                }
            }
        }))
    }
}

pub struct StreamingSessionBuilder {
    provider: Option<Arc<dyn ProviderClient>>,
    registry: Option<Arc<ToolRegistry>>,
    translator: Option<Arc<dyn SchemaTranslator>>,
    model: Option<String>,
    resolver_model: Option<String>,
    system: Option<String>,
    messages: Vec<Message>,
}

impl StreamingSessionBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            registry: None,
            translator: None,
            model: None,
            resolver_model: None,
            system: None,
            messages: Vec::new(),
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

    /// Model used for secondary parameter resolution. Defaults to the
    /// primary model; typically set to something smaller and faster.
    pub fn resolver_model(mut self, model: impl Into<String>) -> Self {
        self.resolver_model = Some(model.into());
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn build(self) -> Result<StreamingSession> {
        Ok(StreamingSession {
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
            resolver_model: self.resolver_model,
            system: self.system,
            messages: self.messages,
            state: Arc::new(Mutex::new(StreamState::NotStarted)),
            cancel: CancellationToken::new(),
        })
    }
}

impl Default for StreamingSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
