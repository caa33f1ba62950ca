//! Dispatch core.
//!
//! [`Dispatcher::invoke`] is the single translation point between "anything
//! can go wrong in a handler" and the protocol-neutral [`ToolOutcome`]
//! envelope both front ends render. Nothing escapes it except a
//! [`StructuredError`] inside the envelope, panics included.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde::ser::SerializeStruct;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use super::error::{ErrorCode, StructuredError, ToolError};
use super::handlers::Arguments;
use super::registry::ToolRegistry;

/// A request to run one tool.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub tool_name: String,
    pub arguments: Arguments,
}

impl Invocation {
    pub fn new(tool_name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Protocol-neutral outcome of an invocation.
///
/// Serializes as `{"success": true, "data": ...}` or
/// `{"success": false, "error": ...}`; exactly one of the two is present.
/// The text summary travels alongside the data but is never serialized.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success { data: Value, summary: String },
    Failure(StructuredError),
}

impl From<StructuredError> for ToolOutcome {
    fn from(err: StructuredError) -> Self {
        ToolOutcome::Failure(err)
    }
}

impl Serialize for ToolOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ToolOutcome", 2)?;
        match self {
            ToolOutcome::Success { data, .. } => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            ToolOutcome::Failure(err) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", err)?;
            }
        }
        state.end()
    }
}

/// Looks up handlers in the registry and normalizes their outcome.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run a tool and wrap its result.
    ///
    /// No schema validation happens here; every handler checks its own
    /// arguments.
    #[instrument(skip_all, fields(tool = %invocation.tool_name))]
    pub async fn invoke(&self, invocation: Invocation) -> ToolOutcome {
        let tool = match self.registry.lookup(&invocation.tool_name) {
            Ok(tool) => tool,
            Err(err) => {
                warn!("Unknown tool requested: {}", invocation.tool_name);
                return err.into();
            }
        };

        info!("Invoking tool");
        let handler = tool.handler().clone();
        let result = AssertUnwindSafe(handler.call(invocation.arguments))
            .catch_unwind()
            .await;

        let failure = match result {
            Ok(Ok(output)) => match output.to_json() {
                Ok(data) => {
                    info!("Tool completed");
                    let summary = output.summary();
                    return ToolOutcome::Success { data, summary };
                }
                Err(e) => StructuredError::internal(format!("failed to serialize result: {e}")),
            },
            Ok(Err(ToolError::Structured(err))) => err,
            Ok(Err(err @ ToolError::Internal(_))) => err.into_structured(),
            Err(panic) => StructuredError::internal(panic_message(panic.as_ref())),
        };

        if failure.code == ErrorCode::InternalError {
            error!(code = failure.code.code(), data = ?failure.data, "Tool failed unexpectedly");
        } else {
            warn!(code = failure.code.code(), "Tool failed: {}", failure.message);
        }
        ToolOutcome::Failure(failure)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::handlers::{HandlerResult, ToolHandler};
    use crate::domains::tools::registry::ToolDescriptor;
    use crate::domains::tools::registry::tests::{EchoHandler, schema};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait::async_trait]
    impl ToolHandler for CountingHandler {
        async fn call(&self, _arguments: Arguments) -> HandlerResult {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(StructuredError::rate_limited("Alpha Vantage").into())
        }
    }

    struct FailingHandler;

    #[async_trait::async_trait]
    impl ToolHandler for FailingHandler {
        async fn call(&self, _arguments: Arguments) -> HandlerResult {
            Err(ToolError::internal("database on fire"))
        }
    }

    struct PanickingHandler;

    #[async_trait::async_trait]
    impl ToolHandler for PanickingHandler {
        async fn call(&self, _arguments: Arguments) -> HandlerResult {
            panic!("unreachable state");
        }
    }

    fn dispatcher(calls: Arc<AtomicUsize>) -> Dispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(
            ToolDescriptor::new("echo", "echo", schema("keywords")),
            Arc::new(EchoHandler),
        );
        registry.register(
            ToolDescriptor::new("limited", "limited", schema("symbol")),
            Arc::new(CountingHandler(calls)),
        );
        registry.register(
            ToolDescriptor::new("failing", "failing", schema("x")),
            Arc::new(FailingHandler),
        );
        registry.register(
            ToolDescriptor::new("panicking", "panicking", schema("x")),
            Arc::new(PanickingHandler),
        );
        Dispatcher::new(Arc::new(registry))
    }

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    fn failure(outcome: ToolOutcome) -> StructuredError {
        match outcome {
            ToolOutcome::Failure(err) => err,
            ToolOutcome::Success { data, .. } => panic!("expected failure, got {data}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_never_reaches_a_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let outcome = dispatcher(calls.clone())
            .invoke(Invocation::new("missing", Arguments::new()))
            .await;
        let err = failure(outcome);
        assert_eq!(err.code, ErrorCode::MethodNotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_is_wrapped_with_data() {
        let outcome = dispatcher(Arc::default())
            .invoke(Invocation::new("echo", args(json!({ "keywords": "tesla" }))))
            .await;
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["search_keywords"], "tesla");
        assert!(value.get("error").is_none());
        assert!(value.get("summary").is_none());

        let ToolOutcome::Success { summary, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(summary, "No stocks found matching 'tesla'");
    }

    #[tokio::test]
    async fn test_structured_error_passes_through_unchanged() {
        let calls = Arc::new(AtomicUsize::new(0));
        let outcome = dispatcher(calls.clone())
            .invoke(Invocation::new("limited", Arguments::new()))
            .await;
        assert_eq!(
            outcome,
            ToolOutcome::Failure(StructuredError::rate_limited("Alpha Vantage"))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], -32004);
        assert!(value.get("data").is_none());
    }

    #[tokio::test]
    async fn test_internal_failure_is_downgraded() {
        let outcome = dispatcher(Arc::default())
            .invoke(Invocation::new("failing", Arguments::new()))
            .await;
        let err = failure(outcome);
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "Internal server error");
        assert_eq!(err.data_value("original_error"), Some(&json!("database on fire")));
    }

    #[tokio::test]
    async fn test_panic_is_caught_as_internal_error() {
        let outcome = dispatcher(Arc::default())
            .invoke(Invocation::new("panicking", Arguments::new()))
            .await;
        let err = failure(outcome);
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(
            err.data_value("original_error"),
            Some(&json!("handler panicked: unreachable state"))
        );
    }
}
