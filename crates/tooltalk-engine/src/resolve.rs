//! Parameter resolver.
//!
//! Two strategies behind one seam, so the rest of the pipeline never cares
//! which one produced the value: inline values are coerced and validated
//! directly; deferred context goes through one secondary generation call
//! that is asked to emit a schema-conforming JSON object between markers.

use crate::grammar::{JSON_CLOSE, JSON_OPEN};
use async_stream::stream;
use futures::stream::{Stream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tooltalk_core::{
    Error, Message, ProviderClient, ProviderEvent, ProviderRequest, Result, SchemaTranslator, Tool,
};
use tooltalk_tools::PropertyKind;

/// Token ceiling for the secondary resolution call. Parameter objects are
/// small; anything beyond this is the resolver model rambling.
pub const RESOLUTION_MAX_TOKENS: u32 = 1024;

/// Progress of one deferred resolution.
#[derive(Debug)]
pub enum ResolutionEvent {
    /// A chunk arrived on the secondary stream. Lets the outer event
    /// stream stay live while resolution is in flight.
    Progress,
    /// Terminal: the resolved, validated parameter value or the error.
    Resolved(Result<Value>),
}

/// Resolves inline parameters: coerce tag text by declared type, then
/// validate against the tool's schema.
pub fn resolve_inline(
    tool: &Arc<dyn Tool>,
    translator: &dyn SchemaTranslator,
    params: &[(String, String)],
) -> Result<Value> {
    let schema = tool.schema();
    let mut object = serde_json::Map::new();
    for (name, raw) in params {
        object.insert(name.clone(), coerce(&schema, name, raw));
    }

    translator
        .validate(&schema, &Value::Object(object))
        .map_err(|failure| Error::ParameterValidation {
            tool: tool.name().to_string(),
            problems: failure.problems,
        })
}

/// Coerces a tag's text by the schema's declared type for that property.
/// A literal that does not parse is left as a string, so the translator
/// reports it as a type problem rather than us inventing a second error
/// path.
fn coerce(schema: &Value, name: &str, raw: &str) -> Value {
    let declared = schema["properties"][name]["type"]
        .as_str()
        .and_then(PropertyKind::from_name);
    let text = raw.trim();
    match declared {
        Some(PropertyKind::Number) => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Some(PropertyKind::Integer) => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Some(PropertyKind::Boolean) => text
            .parse::<bool>()
            .map(Value::Bool)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Some(PropertyKind::Array | PropertyKind::Object) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
        Some(PropertyKind::String) | None => Value::String(raw.to_string()),
    }
}

/// Resolves deferred context via one secondary streaming call.
///
/// Yields [`ResolutionEvent::Progress`] per delta and exactly one
/// [`ResolutionEvent::Resolved`] at the end. If the token is cancelled
/// mid-stream the sequence simply ends: no terminal event, no error.
/// There is no retry: a resolver model that fails to produce parseable,
/// valid JSON yields an error outcome for the tool.
pub fn resolution_stream(
    provider: Arc<dyn ProviderClient>,
    translator: Arc<dyn SchemaTranslator>,
    tool: Arc<dyn Tool>,
    model: String,
    context: String,
    cancel: CancellationToken,
) -> impl Stream<Item = ResolutionEvent> + Send {
    stream! {
        let schema = tool.schema();
        let system = format!(
            "Construct the arguments for the function \"{name}\" from the context \
provided by the user.\n\nThe arguments must be a single JSON object conforming \
to this schema:\n{description}\n\nRespond with only the JSON object, enclosed \
like this: {open}{{...}}{close}",
            name = tool.name(),
            description = translator.describe(&schema),
            open = JSON_OPEN,
            close = JSON_CLOSE,
        );
        let request = ProviderRequest {
            model,
            system: Some(system),
            messages: vec![Message::user(context)],
            stop_sequences: vec![JSON_CLOSE.to_string()],
            max_tokens: Some(RESOLUTION_MAX_TOKENS),
        };

        let mut deltas = match provider.create_streaming_response(request, cancel.clone()).await {
            Ok(s) => s,
            Err(e) => {
                yield ResolutionEvent::Resolved(Err(e));
                return;
            }
        };

        let mut text = String::new();
        loop {
            tokio::select! {
                // Checked first so a cancelled consumer never sees
                // another progress tick.
                biased;
                _ = cancel.cancelled() => return,
                next = deltas.next() => match next {
                    Some(Ok(ProviderEvent::ContentBlockDelta { text: chunk, .. })) => {
                        text.push_str(&chunk);
                        yield ResolutionEvent::Progress;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        yield ResolutionEvent::Resolved(Err(e));
                        return;
                    }
                    None => break,
                },
            }
        }
        if cancel.is_cancelled() {
            return;
        }

        yield ResolutionEvent::Resolved(extract_and_validate(
            &text,
            tool.name(),
            &schema,
            translator.as_ref(),
        ));
    }
}

fn extract_and_validate(
    text: &str,
    tool_name: &str,
    schema: &Value,
    translator: &dyn SchemaTranslator,
) -> Result<Value> {
    let Some(start) = text.find(JSON_OPEN) else {
        return Err(Error::ParameterResolution {
            tool: tool_name.to_string(),
            message: format!("resolver output contains no {JSON_OPEN} marker"),
        });
    };
    let body = &text[start + JSON_OPEN.len()..];
    // The closing marker is a stop sequence, so it is usually absent.
    let body = match body.find(JSON_CLOSE) {
        Some(end) => &body[..end],
        None => body,
    };

    let value: Value =
        serde_json::from_str(body.trim()).map_err(|e| Error::ParameterResolution {
            tool: tool_name.to_string(),
            message: format!("resolver output is not valid JSON: {e}"),
        })?;

    translator
        .validate(schema, &value)
        .map_err(|failure| Error::ParameterValidation {
            tool: tool_name.to_string(),
            problems: failure.problems,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tooltalk_core::ToolResponse;
    use tooltalk_tools::{FunctionTool, JsonSchemaTranslator, ToolSchema};

    fn forecast_tool() -> Arc<dyn Tool> {
        Arc::new(
            FunctionTool::builder()
                .name("forecast")
                .description("Weather forecast")
                .schema(
                    ToolSchema::new()
                        .property("city", PropertyKind::String, "City")
                        .property("days", PropertyKind::Integer, "Days ahead")
                        .property("detailed", PropertyKind::Boolean, "Hourly detail")
                        .required("city")
                        .build(),
                )
                .execute(|_| async {
                    Ok(ToolResponse {
                        result: Value::Null,
                    })
                })
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_inline_coercion() {
        let tool = forecast_tool();
        let translator = JsonSchemaTranslator::new();
        let params = vec![
            ("city".to_string(), "Paris".to_string()),
            ("days".to_string(), "3".to_string()),
            ("detailed".to_string(), "true".to_string()),
        ];

        let value = resolve_inline(&tool, &translator, &params).unwrap();
        assert_eq!(value["city"], "Paris");
        assert_eq!(value["days"], 3);
        assert_eq!(value["detailed"], true);
    }

    #[test]
    fn test_inline_bad_literal_becomes_validation_problem() {
        let tool = forecast_tool();
        let translator = JsonSchemaTranslator::new();
        let params = vec![
            ("city".to_string(), "Paris".to_string()),
            ("days".to_string(), "soon".to_string()),
        ];

        let err = resolve_inline(&tool, &translator, &params).unwrap_err();
        match err {
            Error::ParameterValidation { tool, problems } => {
                assert_eq!(tool, "forecast");
                assert!(problems[0].contains("days"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extract_and_validate() {
        let tool = forecast_tool();
        let translator = JsonSchemaTranslator::new();
        let schema = tool.schema();

        // Stop sequence usually eats the closing marker
        let value = extract_and_validate(
            "here you go: <json>{\"city\": \"Oslo\"}",
            "forecast",
            &schema,
            &translator,
        )
        .unwrap();
        assert_eq!(value["city"], "Oslo");

        let err = extract_and_validate("no markers at all", "forecast", &schema, &translator)
            .unwrap_err();
        assert!(matches!(err, Error::ParameterResolution { .. }));

        let err = extract_and_validate("<json>{not json", "forecast", &schema, &translator)
            .unwrap_err();
        assert!(matches!(err, Error::ParameterResolution { .. }));
    }
}
