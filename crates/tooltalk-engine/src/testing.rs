//! Shared test utilities for orchestration testing
//!
//! This module provides deterministic doubles for the provider and for
//! tools, reused across unit and integration tests.

use async_stream::stream;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tooltalk_core::{
    Error, ProviderClient, ProviderEvent, ProviderEventStream, ProviderRequest, ProviderResponse,
    Result, ToolResponse,
};
use tooltalk_tools::{FunctionTool, PropertyKind, ToolSchema};

/// Scripted provider double.
///
/// Serves canned response texts in order to both the buffered and the
/// streaming entry points, records every request it sees, and counts the
/// streams that were cut short by cancellation.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ProviderRequest>>,
    cancelled_streams: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
            cancelled_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of requests served so far, buffered and streaming combined.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Copy of every request seen, in arrival order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of streaming responses that observed cancellation before
    /// finishing their script.
    pub fn cancelled_stream_count(&self) -> usize {
        self.cancelled_streams.load(Ordering::SeqCst)
    }

    fn next_response(&self, request: ProviderRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::provider_error("script exhausted"))
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn create_response(&self, request: ProviderRequest) -> Result<ProviderResponse> {
        let content = self.next_response(request)?;
        Ok(ProviderResponse {
            content,
            stop_reason: Some("end_turn".to_string()),
        })
    }

    async fn create_streaming_response(
        &self,
        request: ProviderRequest,
        cancel: CancellationToken,
    ) -> Result<ProviderEventStream> {
        let content = self.next_response(request)?;
        let watch = CancelWatch {
            cancel: cancel.clone(),
            counter: self.cancelled_streams.clone(),
            finished: false,
        };
        let stream = stream! {
            let mut watch = watch;
            yield Ok(ProviderEvent::MessageStart);
            yield Ok(ProviderEvent::ContentBlockStart { index: 0 });
            for chunk in chunk_text(&content) {
                if cancel.is_cancelled() {
                    return;
                }
                yield Ok(ProviderEvent::ContentBlockDelta { index: 0, text: chunk });
                tokio::task::yield_now().await;
            }
            yield Ok(ProviderEvent::ContentBlockStop { index: 0 });
            yield Ok(ProviderEvent::MessageStop);
            watch.finished = true;
        };
        Ok(Box::new(Box::pin(stream)))
    }
}

/// Counts a stream as cancelled when it is dropped or abandoned before
/// finishing its script while the token is triggered, whether the
/// consumer observed the cancellation by polling or just dropped us.
struct CancelWatch {
    cancel: CancellationToken,
    counter: Arc<AtomicUsize>,
    finished: bool,
}

impl Drop for CancelWatch {
    fn drop(&mut self) {
        if !self.finished && self.cancel.is_cancelled() {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Splits text into small chunks on char boundaries, so streaming tests
/// exercise reassembly without altering the text.
fn chunk_text(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(8).map(|c| c.iter().collect()).collect()
}

/// A tool that always returns the given value.
pub fn const_tool(name: &str, result: Value) -> FunctionTool {
    FunctionTool::builder()
        .name(name)
        .description(format!("Test tool '{name}'"))
        .schema(
            ToolSchema::new()
                .property("query", PropertyKind::String, "Input")
                .required("query")
                .build(),
        )
        .execute(move |_| {
            let result = result.clone();
            async move { Ok(ToolResponse { result }) }
        })
        .build()
        .expect("const tool builds")
}

/// A tool that always fails with the given message.
pub fn failing_tool(name: &str, message: &str) -> FunctionTool {
    let message = message.to_string();
    FunctionTool::builder()
        .name(name)
        .description(format!("Failing test tool '{name}'"))
        .schema(
            ToolSchema::new()
                .property("query", PropertyKind::String, "Input")
                .required("query")
                .build(),
        )
        .execute(move |_| {
            let message = message.clone();
            async move { Err(Error::Other(anyhow::anyhow!("{message}"))) }
        })
        .build()
        .expect("failing tool builds")
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_scripted_provider_buffered() {
        let provider = ScriptedProvider::new(vec!["first", "second"]);
        let request = ProviderRequest {
            model: "test".to_string(),
            system: None,
            messages: vec![],
            stop_sequences: vec![],
            max_tokens: None,
        };

        let first = provider.create_response(request.clone()).await.unwrap();
        assert_eq!(first.content, "first");
        let second = provider.create_response(request.clone()).await.unwrap();
        assert_eq!(second.content, "second");
        assert!(provider.create_response(request).await.is_err());
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_scripted_provider_streaming_reassembles() {
        let provider = ScriptedProvider::new(vec!["a reply long enough to chunk"]);
        let request = ProviderRequest {
            model: "test".to_string(),
            system: None,
            messages: vec![],
            stop_sequences: vec![],
            max_tokens: None,
        };

        let mut stream = provider
            .create_streaming_response(request, CancellationToken::new())
            .await
            .unwrap();
        let mut text = String::new();
        while let Some(event) = stream.next().await {
            if let ProviderEvent::ContentBlockDelta { text: chunk, .. } = event.unwrap() {
                text.push_str(&chunk);
            }
        }
        assert_eq!(text, "a reply long enough to chunk");
    }
}
