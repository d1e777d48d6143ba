//! Gateway: routes JSON-RPC methods onto the registry, the manifest builder
//! and the secure wrapper.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::governance::{RateLimiter, SecureHandler};
use crate::tools::{Arguments, ContentBlock, Introspector, ManifestBuilder, ManifestView, ToolRegistry};
use crate::types::{Config, Error, Result, ServerConfig, SessionId};

/// Protocol revision announced by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// URI prefix of the manifest resources.
pub const MANIFEST_URI_PREFIX: &str = "toolgate://manifest/";

/// Dispatch surface shared by every connection.
pub struct Gateway {
    registry: Arc<ToolRegistry>,
    secured: HashMap<String, SecureHandler>,
    limiter: Arc<RateLimiter>,
    manifest: ManifestBuilder,
    server: ServerConfig,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("registry", &self.registry)
            .field("server", &self.server.name)
            .finish()
    }
}

impl Gateway {
    /// Wrap every registered tool once; the registry is read-only from here on.
    pub fn new(
        registry: Arc<ToolRegistry>,
        limiter: Arc<RateLimiter>,
        manifest: ManifestBuilder,
        server: ServerConfig,
    ) -> Self {
        let secured = registry
            .list()
            .into_iter()
            .map(|tool| {
                (
                    tool.descriptor.id.clone(),
                    SecureHandler::for_tool(tool, Arc::clone(&limiter)),
                )
            })
            .collect();
        Self {
            registry,
            secured,
            limiter,
            manifest,
            server,
        }
    }

    /// Gateway over a loaded registry using the built-in capability table for
    /// manifests.
    pub fn from_config(config: &Config, registry: ToolRegistry) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        let manifest = ManifestBuilder::new(
            Introspector::builtin(config.loader.clone()),
            config.server.clone(),
        );
        Self::new(Arc::new(registry), limiter, manifest, config.server.clone())
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.server
    }

    /// Handle one method call on behalf of `session`.
    pub async fn dispatch(&self, session: &SessionId, method: &str, params: Value) -> Result<Value> {
        match method {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(Value::Object(Map::new())),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(session, params).await,
            "resources/list" => Ok(list_resources()),
            "resources/read" => self.read_resource(session, params).await,
            other => Err(Error::method_not_found(other)),
        }
    }

    fn initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": self.server.name,
                "version": self.server.version,
            },
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "subscribe": false, "listChanged": false },
            },
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .registry
            .list()
            .into_iter()
            .map(|tool| {
                let d = &tool.descriptor;
                serde_json::json!({
                    "name": d.id,
                    "description": d.description,
                    "inputSchema": d.input_schema(),
                    "annotations": d.annotations,
                })
            })
            .collect();
        serde_json::json!({ "tools": tools })
    }

    async fn call_tool(&self, session: &SessionId, params: Value) -> Result<Value> {
        let name = str_field(&params, "name")?;
        let arguments: Arguments = match params.get("arguments") {
            None | Some(Value::Null) => Arguments::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(Error::validation("arguments must be an object")),
        };

        let secure = self
            .secured
            .get(name)
            .ok_or_else(|| Error::not_found(format!("Unknown tool: {}", name)))?;

        match secure.call(session.as_str(), arguments).await {
            Ok(output) => Ok(serde_json::json!({
                "content": output.content,
                "isError": false,
            })),
            Err(err) => {
                tracing::debug!(tool = name, session = %session, kind = ?err.kind(), "tool call refused: {}", err);
                let content = vec![ContentBlock::Text {
                    text: err.to_string(),
                }];
                Ok(serde_json::json!({
                    "content": content,
                    "isError": true,
                }))
            }
        }
    }

    /// Manifest builds replay entry points, so reads share the session's
    /// rate-limit window with tool calls.
    async fn read_resource(&self, session: &SessionId, params: Value) -> Result<Value> {
        if !self.limiter.allow(session.as_str()) {
            return Err(Error::rate_limited(format!(
                "at most {} requests per {} ms, retry later",
                self.limiter.max_requests(),
                self.limiter.window_ms()
            )));
        }

        let uri = str_field(&params, "uri")?;
        let view: ManifestView = uri
            .strip_prefix(MANIFEST_URI_PREFIX)
            .ok_or_else(|| Error::not_found(format!("Unknown resource: {}", uri)))?
            .parse()?;

        let body = self.manifest.build(view).await?;
        Ok(serde_json::json!({
            "contents": [{
                "uri": uri,
                "mimeType": "application/json",
                "text": serde_json::to_string_pretty(&body)?,
            }]
        }))
    }
}

fn list_resources() -> Value {
    let resources: Vec<Value> = ManifestView::ALL
        .iter()
        .map(|view| {
            let description = match view {
                ManifestView::Info => "Server information and aggregate counts",
                ManifestView::Tools => "Tools grouped by category",
                ManifestView::Categories => "Category descriptions and tool counts",
            };
            serde_json::json!({
                "uri": format!("{}{}", MANIFEST_URI_PREFIX, view.as_str()),
                "name": format!("manifest-{}", view.as_str()),
                "description": description,
                "mimeType": "application/json",
            })
        })
        .collect();
    serde_json::json!({ "resources": resources })
}

fn str_field<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::validation(format!("Missing required field: {}", key)))
}
