//! Metadata introspection.
//!
//! Replays capability entry points against a [`RecordingRegistrar`] to learn
//! what a module would register, without keeping or running any handler.
//! Failures here are never surfaced: the tool just drops out of the pass.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::catalog::ToolDescriptor;
use super::loader::{run_entry_point, sorted_records, LoadError, ModuleRecord};
use super::registry::RecordingRegistrar;
use crate::types::LoaderConfig;

/// Per-category metadata derived from one introspection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMetadata {
    pub name: String,
    pub description: String,
    /// Tool directory names of the valid tools, sorted.
    pub tools: Vec<String>,
}

impl CategoryMetadata {
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Compose a category description from sampled tool descriptions.
///
/// `descriptions` must already be distinct; `tool_count` is the number of
/// valid tools in the category, sampled or not.
pub fn synthesize_description(category: &str, descriptions: &[String], tool_count: usize) -> String {
    let name = capitalize(category);
    match descriptions {
        [] => format!("{} tools and utilities ({} tools available)", name, tool_count),
        [only] => only.clone(),
        few if few.len() <= 3 => format!("{} tools: {}", name, few.join(", ")),
        many => format!(
            "{} category with {} tools including: {} and more",
            name,
            tool_count,
            many[..2].join(", ")
        ),
    }
}

/// Derives descriptors and category metadata from the module table.
///
/// A module that times out is never replayed: its blocking thread may still
/// be running, and every replay would park another one.
#[derive(Debug, Clone)]
pub struct Introspector {
    modules: &'static [ModuleRecord],
    config: LoaderConfig,
    timed_out: Arc<Mutex<HashSet<String>>>,
}

impl Introspector {
    pub fn new(modules: &'static [ModuleRecord], config: LoaderConfig) -> Self {
        Self {
            modules,
            config,
            timed_out: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Introspector over the build-time generated capability table.
    pub fn builtin(config: LoaderConfig) -> Self {
        Self::new(crate::capabilities::MODULES, config)
    }

    /// Descriptors one module would register. `None` if capture failed.
    pub async fn describe(&self, record: &ModuleRecord) -> Option<Vec<ToolDescriptor>> {
        let path = record.path();
        if self.timed_out.lock().contains(&path) {
            return None;
        }

        match run_entry_point::<RecordingRegistrar>(record, self.config.module_timeout).await {
            Ok(recorder) => Some(recorder.into_descriptors()),
            Err(err @ LoadError::TimedOut { .. }) => {
                if self.timed_out.lock().insert(path) {
                    tracing::warn!(module = %record.path(), "introspection disabled for module: {}", err);
                }
                None
            }
            Err(err) => {
                tracing::debug!(module = %record.path(), "introspection skipped: {}", err);
                None
            }
        }
    }

    /// Category metadata for every category with at least one valid tool,
    /// sorted by category name.
    pub async fn snapshot(&self) -> Vec<CategoryMetadata> {
        let mut by_category: BTreeMap<&'static str, Vec<ModuleRecord>> = BTreeMap::new();
        for record in sorted_records(self.modules) {
            if record.is_valid() {
                by_category.entry(record.category).or_default().push(record);
            }
        }

        let mut categories = Vec::with_capacity(by_category.len());
        for (category, records) in by_category {
            let mut descriptions: Vec<String> = Vec::new();
            for record in records.iter().take(self.config.sample_size) {
                let Some(descriptors) = self.describe(record).await else {
                    continue;
                };
                for descriptor in descriptors {
                    let text = descriptor.description.trim();
                    if !text.is_empty() && !descriptions.iter().any(|d| d == text) {
                        descriptions.push(text.to_string());
                    }
                }
            }

            let tools: Vec<String> = records.iter().map(|r| r.tool.to_string()).collect();
            categories.push(CategoryMetadata {
                name: category.to_string(),
                description: synthesize_description(category, &descriptions, tools.len()),
                tools,
            });
        }
        categories
    }
}
