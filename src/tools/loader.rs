//! Capability loader: runs every discovered entry point against the live
//! registry.
//!
//! Discovery itself happens at build time (see `build.rs` and
//! [`super::scan`]); the loader consumes the resulting [`ModuleRecord`] table.
//! A broken module is logged and skipped; it never stops its siblings.

use std::time::Duration;

use thiserror::Error;

use super::registry::{Insertion, RegisterFn, ToolRegistrar, ToolRegistry};
use crate::types::{DuplicatePolicy, LoaderConfig};

/// How a tool directory resolved at build time.
#[derive(Clone, Copy)]
pub enum EntryPoint {
    /// Entry module present with a `register_*` function.
    Registered {
        symbol: &'static str,
        register: RegisterFn,
    },
    /// Tool directory without an entry module.
    MissingModule,
    /// Entry module without a `register_*` function.
    NoEntryPoint,
}

impl std::fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryPoint::Registered { symbol, .. } => write!(f, "Registered({})", symbol),
            EntryPoint::MissingModule => f.write_str("MissingModule"),
            EntryPoint::NoEntryPoint => f.write_str("NoEntryPoint"),
        }
    }
}

/// One `<category>/<tool>` directory of the capability tree.
#[derive(Debug, Clone, Copy)]
pub struct ModuleRecord {
    pub category: &'static str,
    pub tool: &'static str,
    pub entry: EntryPoint,
}

impl ModuleRecord {
    /// The module can be registered (entry module and entry point present).
    pub fn is_valid(&self) -> bool {
        matches!(self.entry, EntryPoint::Registered { .. })
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.category, self.tool)
    }
}

/// Records sorted by (category, tool); ties keep table order.
pub fn sorted_records(records: &[ModuleRecord]) -> Vec<ModuleRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| (a.category, a.tool).cmp(&(b.category, b.tool)));
    sorted
}

/// Why a module (or one of its tools) was not loaded. Operator-facing only.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{module}: entry module not found")]
    MissingModule { module: String },

    #[error("{module}: no register_* entry point")]
    NoEntryPoint { module: String },

    #[error("{module}: registration failed: {reason}")]
    Registration { module: String, reason: String },

    #[error("{module}: registration panicked: {reason}")]
    Panicked { module: String, reason: String },

    #[error("{module}: registration timed out after {timeout:?}")]
    TimedOut { module: String, timeout: Duration },

    #[error("{module}: tool id '{tool_id}' already registered by {existing_category}")]
    DuplicateTool {
        module: String,
        tool_id: String,
        existing_category: String,
    },
}

/// Extract panic message from panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic (no message)".to_string()
    }
}

/// Run one entry point against a fresh registrar on the blocking pool.
///
/// On timeout the registrar is abandoned with whatever it captured, so late
/// registrations never reach the caller.
pub(crate) async fn run_entry_point<R>(
    record: &ModuleRecord,
    timeout: Duration,
) -> Result<R, LoadError>
where
    R: ToolRegistrar + Default + 'static,
{
    let module = record.path();
    let register = match record.entry {
        EntryPoint::Registered { register, .. } => register,
        EntryPoint::MissingModule => return Err(LoadError::MissingModule { module }),
        EntryPoint::NoEntryPoint => return Err(LoadError::NoEntryPoint { module }),
    };

    let task = tokio::task::spawn_blocking(move || {
        let mut registrar = R::default();
        register(&mut registrar).map(|()| registrar)
    });

    match tokio::time::timeout(timeout, task).await {
        Err(_elapsed) => Err(LoadError::TimedOut { module, timeout }),
        Ok(Err(join_err)) => {
            let reason = if join_err.is_panic() {
                panic_message(&*join_err.into_panic())
            } else {
                "task cancelled".to_string()
            };
            Err(LoadError::Panicked { module, reason })
        }
        Ok(Ok(Err(err))) => Err(LoadError::Registration {
            module,
            reason: err.to_string(),
        }),
        Ok(Ok(Ok(registrar))) => Ok(registrar),
    }
}

/// Summary of one load pass.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Tool ids in load order.
    pub loaded: Vec<String>,
    pub skipped: Vec<LoadError>,
}

/// Loads capability modules into a live [`ToolRegistry`].
#[derive(Debug, Clone)]
pub struct CapabilityLoader {
    modules: &'static [ModuleRecord],
    config: LoaderConfig,
}

impl CapabilityLoader {
    pub fn new(modules: &'static [ModuleRecord], config: LoaderConfig) -> Self {
        Self { modules, config }
    }

    /// Loader over the build-time generated capability table.
    pub fn builtin(config: LoaderConfig) -> Self {
        Self::new(crate::capabilities::MODULES, config)
    }

    /// Load every module in (category, tool) order. Never fails; problems end
    /// up in the report and the log.
    pub async fn load(&self) -> (ToolRegistry, LoadReport) {
        let mut registry = ToolRegistry::new();
        let mut report = LoadReport::default();

        for record in sorted_records(self.modules) {
            match run_entry_point::<ToolRegistry>(&record, self.config.module_timeout).await {
                Ok(mut scratch) => {
                    self.commit(&record, &mut scratch, &mut registry, &mut report);
                }
                Err(err) => {
                    tracing::warn!(module = %record.path(), "skipping capability: {}", err);
                    report.skipped.push(err);
                }
            }
        }

        tracing::info!(
            tools = registry.len(),
            categories = registry.categories().len(),
            skipped = report.skipped.len(),
            "capabilities loaded"
        );
        (registry, report)
    }

    fn commit(
        &self,
        record: &ModuleRecord,
        scratch: &mut ToolRegistry,
        registry: &mut ToolRegistry,
        report: &mut LoadReport,
    ) {
        let staged = scratch.take_staged();
        if staged.is_empty() {
            tracing::warn!(module = %record.path(), "entry point registered no tools");
        }

        for (descriptor, handler) in staged {
            let id = descriptor.id.clone();
            if let Some(existing) = registry.get(&id) {
                if self.config.duplicate_policy == DuplicatePolicy::Reject {
                    let err = LoadError::DuplicateTool {
                        module: record.path(),
                        tool_id: id,
                        existing_category: existing.category.clone(),
                    };
                    tracing::warn!("rejecting duplicate tool: {}", err);
                    report.skipped.push(err);
                    continue;
                }
            }

            if let Insertion::Replaced { previous_category } =
                registry.insert(record.category, descriptor, handler)
            {
                tracing::warn!(
                    tool = %id,
                    previous_category = %previous_category,
                    category = record.category,
                    "tool id registered twice; later registration wins"
                );
            }
            tracing::debug!(tool = %id, category = record.category, "registered tool");
            report.loaded.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::catalog::ToolDescriptor;
    use crate::tools::registry::{handler_fn, Arguments, ToolOutput};
    use crate::types::{Error, Result};

    fn register_as(registrar: &mut dyn ToolRegistrar, id: &str, description: &str) -> Result<()> {
        registrar.register_tool(
            ToolDescriptor::new(id, description),
            handler_fn(|_args: Arguments| async move { Ok(ToolOutput::text("ok")) }),
        )
    }

    fn register_alpha(r: &mut dyn ToolRegistrar) -> Result<()> {
        register_as(r, "alpha", "Alpha tool")
    }

    fn register_beta(r: &mut dyn ToolRegistrar) -> Result<()> {
        register_as(r, "beta", "Beta tool")
    }

    fn register_gamma(r: &mut dyn ToolRegistrar) -> Result<()> {
        register_as(r, "gamma", "Gamma tool")
    }

    fn register_dup_first(r: &mut dyn ToolRegistrar) -> Result<()> {
        register_as(r, "dup", "first")
    }

    fn register_dup_second(r: &mut dyn ToolRegistrar) -> Result<()> {
        register_as(r, "dup", "second")
    }

    fn register_failing(_r: &mut dyn ToolRegistrar) -> Result<()> {
        Err(Error::internal("boom"))
    }

    fn register_panicking(_r: &mut dyn ToolRegistrar) -> Result<()> {
        panic!("module exploded")
    }

    fn register_partial_then_fail(r: &mut dyn ToolRegistrar) -> Result<()> {
        register_as(r, "partial", "never committed")?;
        Err(Error::internal("second tool failed"))
    }

    fn register_slow(r: &mut dyn ToolRegistrar) -> Result<()> {
        std::thread::sleep(Duration::from_millis(500));
        register_as(r, "slow", "too late")
    }

    const fn registered(category: &'static str, tool: &'static str, register: RegisterFn) -> ModuleRecord {
        ModuleRecord {
            category,
            tool,
            entry: EntryPoint::Registered {
                symbol: "register_test",
                register,
            },
        }
    }

    fn config() -> LoaderConfig {
        LoaderConfig {
            module_timeout: Duration::from_millis(100),
            ..LoaderConfig::default()
        }
    }

    static ORDERED: &[ModuleRecord] = &[
        registered("B", "gamma", register_gamma),
        registered("A", "beta", register_beta),
        registered("A", "alpha", register_alpha),
    ];

    #[tokio::test]
    async fn test_load_in_lexicographic_order() {
        let (registry, report) = CapabilityLoader::new(ORDERED, config()).load().await;
        assert_eq!(report.loaded, vec!["alpha", "beta", "gamma"]);
        assert!(report.skipped.is_empty());

        let categories: Vec<(&String, Vec<&String>)> = registry
            .categories()
            .iter()
            .map(|(c, ids)| (c, ids.iter().collect()))
            .collect();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].0, "A");
        assert_eq!(categories[0].1, vec!["alpha", "beta"]);
        assert_eq!(categories[1].0, "B");
        assert_eq!(registry.get("gamma").unwrap().category, "B");
    }

    static BROKEN: &[ModuleRecord] = &[
        registered("text", "alpha", register_alpha),
        ModuleRecord {
            category: "text",
            tool: "missing",
            entry: EntryPoint::MissingModule,
        },
        ModuleRecord {
            category: "text",
            tool: "no-entry",
            entry: EntryPoint::NoEntryPoint,
        },
        registered("text", "p-failing", register_failing),
        registered("text", "q-panicking", register_panicking),
        registered("text", "r-partial", register_partial_then_fail),
        registered("text", "s-slow", register_slow),
        registered("text", "zz-beta", register_beta),
    ];

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_broken_modules_skipped_siblings_loaded() {
        let (registry, report) = CapabilityLoader::new(BROKEN, config()).load().await;

        assert_eq!(registry.list_ids(), vec!["alpha", "beta"]);
        assert_eq!(report.skipped.len(), 6);
        assert!(matches!(report.skipped[0], LoadError::MissingModule { .. }));
        assert!(matches!(report.skipped[1], LoadError::NoEntryPoint { .. }));
        assert!(matches!(report.skipped[2], LoadError::Registration { .. }));
        assert!(
            matches!(&report.skipped[3], LoadError::Panicked { reason, .. } if reason == "module exploded")
        );
        assert!(matches!(report.skipped[4], LoadError::Registration { .. }));
        assert!(matches!(report.skipped[5], LoadError::TimedOut { .. }));
        // A failing module commits nothing, even tools it registered first.
        assert!(!registry.has_tool("partial"));
        assert!(!registry.has_tool("slow"));

        assert!(logs_contain("text/missing: entry module not found"));
        assert!(logs_contain("skipping capability"));
    }

    static DUPLICATES: &[ModuleRecord] = &[
        registered("one", "dup", register_dup_first),
        registered("two", "dup", register_dup_second),
    ];

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_duplicate_last_wins_with_warning() {
        let (registry, report) = CapabilityLoader::new(DUPLICATES, config()).load().await;
        let tool = registry.get("dup").unwrap();
        assert_eq!(tool.descriptor.description, "second");
        assert_eq!(tool.category, "two");
        assert!(!registry.categories().contains_key("one"));
        assert_eq!(report.loaded, vec!["dup", "dup"]);
        assert!(logs_contain("later registration wins"));
    }

    #[tokio::test]
    async fn test_duplicate_rejected_by_policy() {
        let config = LoaderConfig {
            duplicate_policy: DuplicatePolicy::Reject,
            ..config()
        };
        let (registry, report) = CapabilityLoader::new(DUPLICATES, config).load().await;
        let tool = registry.get("dup").unwrap();
        assert_eq!(tool.descriptor.description, "first");
        assert!(matches!(
            &report.skipped[0],
            LoadError::DuplicateTool { existing_category, .. } if existing_category == "one"
        ));
    }

    #[tokio::test]
    async fn test_empty_table_yields_empty_registry() {
        let (registry, report) = CapabilityLoader::new(&[], config()).load().await;
        assert!(registry.is_empty());
        assert!(report.loaded.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(&*payload), "static str");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*payload), "owned");
        let payload: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(&*payload), "Unknown panic (no message)");
    }
}
