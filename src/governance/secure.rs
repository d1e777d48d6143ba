//! Secure handler wrapper: rate limit, validate, sanitize, then invoke.
//!
//! Callers see one of four tagged outcomes and never internal error detail.

use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;

use super::rate_limiter::RateLimiter;
use super::validation::{ValidationError, Validator};
use crate::tools::loader::panic_message;
use crate::tools::{Arguments, BoxedHandler, RegisteredTool, ToolDescriptor, ToolFault, ToolOutput};

/// Coarse class of an invocation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Retry after the window moves.
    RateLimited,
    /// Caller must change the input.
    InvalidInput,
    /// The tool declined the request with its own message.
    Rejected,
    /// Something broke inside the tool.
    Internal,
}

/// Failure of a governed tool call.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Rate limit exceeded: at most {max_requests} requests per {window_ms} ms, retry later")]
    RateLimitExceeded { max_requests: usize, window_ms: i64 },

    #[error("Invalid arguments: {}", .0.join("; "))]
    InvalidArguments(Vec<String>),

    #[error("Invalid value for '{param}': {source}")]
    Validation {
        param: String,
        #[source]
        source: ValidationError,
    },

    #[error("{0}")]
    Rejected(String),

    #[error("Tool execution failed")]
    Execution,
}

impl InvocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InvocationError::RateLimitExceeded { .. } => ErrorKind::RateLimited,
            InvocationError::InvalidArguments(_) | InvocationError::Validation { .. } => {
                ErrorKind::InvalidInput
            }
            InvocationError::Rejected(_) => ErrorKind::Rejected,
            InvocationError::Execution => ErrorKind::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::RateLimited
    }
}

/// A tool body behind rate limiting and input validation.
#[derive(Clone)]
pub struct SecureHandler {
    descriptor: ToolDescriptor,
    handler: BoxedHandler,
    limiter: Arc<RateLimiter>,
    validator: Validator,
}

impl std::fmt::Debug for SecureHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureHandler")
            .field("tool", &self.descriptor.id)
            .finish()
    }
}

impl SecureHandler {
    pub fn new(descriptor: ToolDescriptor, handler: BoxedHandler, limiter: Arc<RateLimiter>) -> Self {
        Self {
            descriptor,
            handler,
            limiter,
            validator: Validator::new(),
        }
    }

    pub fn for_tool(tool: &RegisteredTool, limiter: Arc<RateLimiter>) -> Self {
        Self::new(tool.descriptor.clone(), Arc::clone(&tool.handler), limiter)
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Run the tool on behalf of `identifier`.
    pub async fn call(&self, identifier: &str, args: Arguments) -> Result<ToolOutput, InvocationError> {
        if !self.limiter.allow(identifier) {
            return Err(InvocationError::RateLimitExceeded {
                max_requests: self.limiter.max_requests(),
                window_ms: self.limiter.window_ms(),
            });
        }

        let args = self.prepare(args)?;
        let tool_id = self.descriptor.id.as_str();

        match AssertUnwindSafe(self.handler.call(args)).catch_unwind().await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(ToolFault::Rejected(msg))) => {
                tracing::debug!(tool = tool_id, "tool rejected request: {}", msg);
                Err(InvocationError::Rejected(msg))
            }
            Ok(Err(ToolFault::Internal(err))) => {
                tracing::error!(tool = tool_id, error = %format!("{:#}", err), "tool execution failed");
                Err(InvocationError::Execution)
            }
            Err(payload) => {
                tracing::error!(tool = tool_id, panic = %panic_message(&*payload), "tool panicked");
                Err(InvocationError::Execution)
            }
        }
    }

    /// Schema check, per-rule validation, then sanitization.
    fn prepare(&self, mut args: Arguments) -> Result<Arguments, InvocationError> {
        let errors = self.descriptor.validate_params(&args);
        if !errors.is_empty() {
            return Err(InvocationError::InvalidArguments(errors));
        }
        self.descriptor.fill_defaults(&mut args);

        for param in &self.descriptor.parameters {
            let Some(value) = args.get_mut(&param.name) else {
                continue;
            };

            if let Some(rule) = param.rule {
                for text in string_values(value) {
                    self.validator
                        .validate(rule, text)
                        .map_err(|source| InvocationError::Validation {
                            param: param.name.clone(),
                            source,
                        })?;
                }
            }

            if let Some(mode) = param.sanitize {
                sanitize_in_place(value, |s| mode.apply(s));
            }
        }
        Ok(args)
    }
}

/// String payloads of a value: the string itself or each list item.
fn string_values(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn sanitize_in_place(value: &mut Value, apply: impl Fn(&str) -> String) {
    match value {
        Value::String(s) => *s = apply(s),
        Value::Array(items) => {
            for item in items {
                if let Value::String(s) = item {
                    *s = apply(s);
                }
            }
        }
        _ => {}
    }
}
