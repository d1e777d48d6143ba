//! Line-delimited JSON-RPC server: read loop and per-message handling.

use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use super::codec::{read_message, write_message, Inbound};
use super::router::Gateway;
use crate::types::{rpc_code, Error, SessionId};

fn error_response(id: Value, code: i64, message: impl Into<String>) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message.into(),
        }
    })
}

/// Serves one gateway over reader/writer pairs.
#[derive(Debug)]
pub struct Server {
    gateway: Arc<Gateway>,
    cancel: CancellationToken,
}

impl Server {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops every running `serve` loop when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Serve one connection until EOF or shutdown.
    ///
    /// The connection gets a fresh [`SessionId`], which is its rate-limit
    /// identity.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let session = SessionId::new();
        let max_bytes = self.gateway.server_config().max_message_bytes;
        tracing::info!(session = %session, "connection opened");

        loop {
            let inbound = tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(session = %session, "server shutting down");
                    break;
                }
                read = read_message(&mut reader, max_bytes) => read?,
            };

            let response = match inbound {
                None => break,
                Some(Inbound::TooLarge { limit }) => {
                    tracing::warn!(session = %session, limit, "oversized message dropped");
                    Some(error_response(
                        Value::Null,
                        rpc_code::INVALID_REQUEST,
                        format!("Message exceeds {} bytes", limit),
                    ))
                }
                Some(Inbound::Message(line)) => self.handle_line(&session, &line).await,
            };

            if let Some(response) = response {
                write_message(&mut writer, &response).await?;
            }
        }

        tracing::info!(session = %session, "connection closed");
        Ok(())
    }

    /// Handle one raw message. Notifications yield `None`.
    pub async fn handle_line(&self, session: &SessionId, line: &str) -> Option<Value> {
        let request: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                return Some(error_response(
                    Value::Null,
                    rpc_code::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        };

        let Some(obj) = request.as_object() else {
            return Some(error_response(
                Value::Null,
                rpc_code::INVALID_REQUEST,
                "Invalid request: expected an object",
            ));
        };
        let id = obj.get("id").cloned();

        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            return Some(error_response(
                id.unwrap_or(Value::Null),
                rpc_code::INVALID_REQUEST,
                "Invalid request: jsonrpc must be \"2.0\"",
            ));
        }
        let Some(method) = obj.get("method").and_then(Value::as_str) else {
            return Some(error_response(
                id.unwrap_or(Value::Null),
                rpc_code::INVALID_REQUEST,
                "Invalid request: missing method",
            ));
        };
        let params = obj.get("params").cloned().unwrap_or(Value::Null);

        let result = self.gateway.dispatch(session, method, params).await;

        let Some(id) = id else {
            if let Err(e) = result {
                tracing::debug!(method, "notification not handled: {}", e);
            }
            return None;
        };

        Some(match result {
            Ok(result) => serde_json::json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result,
            }),
            Err(e) => {
                if matches!(e, Error::Internal(_) | Error::Serialization(_) | Error::Io(_)) {
                    tracing::error!(method, "request failed: {}", e);
                }
                error_response(id, e.to_rpc_code(), e.public_message())
            }
        })
    }
}
