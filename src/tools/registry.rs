//! Tool registry: the registration seam and its two implementations.
//!
//! Capability modules only ever see `&mut dyn ToolRegistrar`. At start time
//! that is the live [`ToolRegistry`], which keeps handlers. For metadata it is
//! a [`RecordingRegistrar`], which keeps descriptors and drops handlers
//! without ever calling them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;

use super::catalog::ToolDescriptor;
use crate::types::Result;

/// Arguments of one tool call.
pub type Arguments = Map<String, Value>;

/// One block of tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

/// Result body of a successful tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Concatenated text of all blocks.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|ContentBlock::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Failure returned by a tool body.
#[derive(Debug, thiserror::Error)]
pub enum ToolFault {
    /// Deliberate, caller-facing refusal ("input is not valid base64").
    #[error("{0}")]
    Rejected(String),
    /// Anything unexpected. Logged, never shown to callers.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ToolFault {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// String argument `name`, or a rejection naming it.
pub fn str_arg<'a>(args: &'a Arguments, name: &str) -> std::result::Result<&'a str, ToolFault> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolFault::rejected(format!("Missing string parameter: {}", name)))
}

/// Executable body of a tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Arguments) -> std::result::Result<ToolOutput, ToolFault>;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Send + Sync + Fn(Arguments) -> Fut,
    Fut: Future<Output = std::result::Result<ToolOutput, ToolFault>> + Send,
{
    async fn call(&self, args: Arguments) -> std::result::Result<ToolOutput, ToolFault> {
        (self)(args).await
    }
}

/// Shared handle to a tool body.
pub type BoxedHandler = Arc<dyn ToolHandler>;

/// Box an async closure as a tool body.
pub fn handler_fn<F, Fut>(f: F) -> BoxedHandler
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<ToolOutput, ToolFault>> + Send + 'static,
{
    Arc::new(f)
}

/// Registration-capture surface handed to capability entry points.
pub trait ToolRegistrar: Send {
    fn register_tool(&mut self, descriptor: ToolDescriptor, handler: BoxedHandler) -> Result<()>;
}

/// Signature of a capability module's entry point.
pub type RegisterFn = fn(&mut dyn ToolRegistrar) -> Result<()>;

// =============================================================================
// Recording registrar
// =============================================================================

/// Captures descriptors only. Handlers are dropped on arrival.
#[derive(Debug, Default)]
pub struct RecordingRegistrar {
    descriptors: Vec<ToolDescriptor>,
}

impl RecordingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn into_descriptors(self) -> Vec<ToolDescriptor> {
        self.descriptors
    }
}

impl ToolRegistrar for RecordingRegistrar {
    fn register_tool(&mut self, descriptor: ToolDescriptor, _handler: BoxedHandler) -> Result<()> {
        descriptor.check()?;
        self.descriptors.push(descriptor);
        Ok(())
    }
}

// =============================================================================
// Live registry
// =============================================================================

/// A registered tool: descriptor, owning category and body.
#[derive(Clone)]
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub category: String,
    pub handler: BoxedHandler,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("id", &self.descriptor.id)
            .field("category", &self.category)
            .finish()
    }
}

/// Outcome of inserting one tool into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    New,
    /// Replaced a tool previously registered under this category.
    Replaced { previous_category: String },
}

/// Live mapping of tool id → (descriptor, handler), with a category index.
///
/// Built once by the loader, then shared behind `Arc` and only read.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    categories: BTreeMap<String, BTreeSet<String>>,
    // Registrations made by an entry point that has not been assigned a category yet.
    staged: Vec<(ToolDescriptor, BoxedHandler)>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.len())
            .field("categories", &self.categories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tool under a category. Last registration wins.
    pub fn insert(&mut self, category: &str, descriptor: ToolDescriptor, handler: BoxedHandler) -> Insertion {
        let id = descriptor.id.clone();
        let previous = self.tools.insert(
            id.clone(),
            RegisteredTool {
                descriptor,
                category: category.to_string(),
                handler,
            },
        );

        let outcome = match previous {
            Some(prev) => {
                if let Some(ids) = self.categories.get_mut(&prev.category) {
                    ids.remove(&id);
                    if ids.is_empty() {
                        self.categories.remove(&prev.category);
                    }
                }
                Insertion::Replaced {
                    previous_category: prev.category,
                }
            }
            None => Insertion::New,
        };

        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(id);
        outcome
    }

    /// Take the registrations captured while this registry acted as a
    /// registrar, in registration order.
    pub fn take_staged(&mut self) -> Vec<(ToolDescriptor, BoxedHandler)> {
        std::mem::take(&mut self.staged)
    }

    pub fn get(&self, tool_id: &str) -> Option<&RegisteredTool> {
        self.tools.get(tool_id)
    }

    pub fn has_tool(&self, tool_id: &str) -> bool {
        self.tools.contains_key(tool_id)
    }

    /// All tool ids, sorted.
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tools.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All registered tools, sorted by id.
    pub fn list(&self) -> Vec<&RegisteredTool> {
        let mut tools: Vec<&RegisteredTool> = self.tools.values().collect();
        tools.sort_by(|a, b| a.descriptor.id.cmp(&b.descriptor.id));
        tools
    }

    /// Category name → sorted tool ids.
    pub fn categories(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl ToolRegistrar for ToolRegistry {
    fn register_tool(&mut self, descriptor: ToolDescriptor, handler: BoxedHandler) -> Result<()> {
        descriptor.check()?;
        self.staged.push((descriptor, handler));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo() -> BoxedHandler {
        handler_fn(|args: Arguments| async move {
            Ok(ToolOutput::text(Value::Object(args).to_string()))
        })
    }

    #[tokio::test]
    async fn test_closure_handler_invocation() {
        let handler = echo();
        let mut args = Arguments::new();
        args.insert("k".to_string(), Value::from("v"));
        let out = handler.call(args).await.unwrap();
        assert_eq!(out.joined_text(), r#"{"k":"v"}"#);
    }

    #[test]
    fn test_str_arg() {
        let mut args = Arguments::new();
        args.insert("s".to_string(), Value::from("v"));
        args.insert("n".to_string(), Value::from(1));
        assert_eq!(str_arg(&args, "s").unwrap(), "v");
        assert!(matches!(str_arg(&args, "n"), Err(ToolFault::Rejected(_))));
        assert!(str_arg(&args, "missing").is_err());
    }

    #[test]
    fn test_recording_registrar_never_calls_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = handler_fn(move |_args: Arguments| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(ToolOutput::text("ran")) }
        });

        let mut recorder = RecordingRegistrar::new();
        recorder
            .register_tool(ToolDescriptor::new("t", "desc"), handler)
            .unwrap();

        assert_eq!(recorder.descriptors().len(), 1);
        assert_eq!(recorder.descriptors()[0].description, "desc");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registrars_reject_invalid_descriptor() {
        let mut recorder = RecordingRegistrar::new();
        assert!(recorder.register_tool(ToolDescriptor::new("", "x"), echo()).is_err());

        let mut registry = ToolRegistry::new();
        assert!(registry.register_tool(ToolDescriptor::new("", "x"), echo()).is_err());
        assert!(registry.take_staged().is_empty());
    }

    #[test]
    fn test_live_registration_is_staged_in_order() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(ToolDescriptor::new("b", ""), echo()).unwrap();
        registry.register_tool(ToolDescriptor::new("a", ""), echo()).unwrap();

        let staged: Vec<String> = registry
            .take_staged()
            .into_iter()
            .map(|(d, _)| d.id)
            .collect();
        assert_eq!(staged, vec!["b", "a"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_last_wins_and_moves_category() {
        let mut registry = ToolRegistry::new();
        assert_eq!(
            registry.insert("alpha", ToolDescriptor::new("dup", "first"), echo()),
            Insertion::New
        );
        assert_eq!(
            registry.insert("beta", ToolDescriptor::new("dup", "second"), echo()),
            Insertion::Replaced {
                previous_category: "alpha".to_string()
            }
        );

        assert_eq!(registry.len(), 1);
        let tool = registry.get("dup").unwrap();
        assert_eq!(tool.descriptor.description, "second");
        assert_eq!(tool.category, "beta");
        assert!(!registry.categories().contains_key("alpha"));
        assert!(registry.categories()["beta"].contains("dup"));
    }

    #[test]
    fn test_listing_is_sorted() {
        let mut registry = ToolRegistry::new();
        registry.insert("c", ToolDescriptor::new("zeta", ""), echo());
        registry.insert("c", ToolDescriptor::new("alpha", ""), echo());
        assert_eq!(registry.list_ids(), vec!["alpha", "zeta"]);
        let ids: Vec<&str> = registry.list().iter().map(|t| t.descriptor.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }
}
