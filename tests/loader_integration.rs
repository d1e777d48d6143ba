//! Loader integration tests: the build-time capability table against the
//! source tree, the live registry and the introspector.

use std::path::Path;

use toolgate_core::capabilities::MODULES;
use toolgate_core::tools::scan::scan_capability_tree;
use toolgate_core::tools::{CapabilityLoader, Introspector, ManifestBuilder, ManifestView};
use toolgate_core::types::{LoaderConfig, ServerConfig};

#[test]
fn test_generated_table_matches_source_tree() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join("capabilities");
    let scanned = scan_capability_tree(&root).unwrap();

    let from_tree: Vec<(String, String)> = scanned
        .iter()
        .map(|m| (m.category.clone(), m.tool.clone()))
        .collect();
    let from_table: Vec<(String, String)> = MODULES
        .iter()
        .map(|r| (r.category.to_string(), r.tool.to_string()))
        .collect();

    assert_eq!(from_tree, from_table);
    assert!(MODULES.iter().all(|r| r.is_valid()));
}

#[tokio::test]
async fn test_builtin_load() {
    let (registry, report) = CapabilityLoader::builtin(LoaderConfig::default()).load().await;

    assert!(report.skipped.is_empty());
    assert_eq!(report.loaded.len(), 6);
    assert_eq!(registry.len(), 6);

    let categories: Vec<&str> = registry.categories().keys().map(String::as_str).collect();
    assert_eq!(categories, vec!["crypto", "encoding", "id", "text"]);
    assert_eq!(registry.get("regex-test").unwrap().category, "text");
}

#[tokio::test]
async fn test_introspection_agrees_with_registry() {
    let (registry, _report) = CapabilityLoader::builtin(LoaderConfig::default()).load().await;
    let snapshot = Introspector::builtin(LoaderConfig::default()).snapshot().await;

    assert_eq!(snapshot.len(), registry.categories().len());
    for category in &snapshot {
        assert_eq!(category.tool_count(), registry.categories()[&category.name].len());
        assert!(!category.description.is_empty());
    }
}

#[tokio::test]
async fn test_tools_manifest_is_stable() {
    let builder = ManifestBuilder::new(Introspector::builtin(LoaderConfig::default()), ServerConfig::default());
    let first = builder.build(ManifestView::Tools).await.unwrap();
    let second = builder.build(ManifestView::Tools).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first["toolCategories"]["text"]["tools"],
        serde_json::json!(["html-escape", "regex-test"])
    );
}
