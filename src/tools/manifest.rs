//! Manifest views over introspected metadata.
//!
//! Recomputed on every request so the views always match the current
//! capability set.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::introspect::{CategoryMetadata, Introspector};
use crate::types::{Error, Result, ServerConfig};

/// Feature summary reported by the `info` view.
pub const FEATURES: &[&str] = &[
    "filesystem-organized capability discovery",
    "side-effect-free metadata introspection",
    "per-caller sliding-window rate limiting",
    "input validation with size and format limits",
    "regex catastrophic-backtracking guard",
    "text sanitization and HTML escaping",
];

/// Which manifest view to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestView {
    /// Aggregate counts and feature summary.
    Info,
    /// Category → tool list.
    Tools,
    /// Category → description and tool count.
    Categories,
}

impl ManifestView {
    pub const ALL: [ManifestView; 3] = [ManifestView::Info, ManifestView::Tools, ManifestView::Categories];

    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestView::Info => "info",
            ManifestView::Tools => "tools",
            ManifestView::Categories => "categories",
        }
    }
}

impl FromStr for ManifestView {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "info" => Ok(ManifestView::Info),
            "tools" => Ok(ManifestView::Tools),
            "categories" => Ok(ManifestView::Categories),
            other => Err(Error::not_found(format!("Unknown manifest view: {}", other))),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoView<'a> {
    name: &'a str,
    version: &'a str,
    description: &'static str,
    total_tools: usize,
    total_categories: usize,
    features: &'static [&'static str],
    categories: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct CategoryTools<'a> {
    description: &'a str,
    tools: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolsView<'a> {
    tool_categories: BTreeMap<&'a str, CategoryTools<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CategorySummary<'a> {
    description: &'a str,
    tool_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoriesView<'a> {
    categories: BTreeMap<&'a str, CategorySummary<'a>>,
    total_tools: usize,
}

/// Render one view from a snapshot. Pure.
pub fn render(view: ManifestView, server: &ServerConfig, snapshot: &[CategoryMetadata]) -> Result<Value> {
    let total_tools: usize = snapshot.iter().map(CategoryMetadata::tool_count).sum();

    let value = match view {
        ManifestView::Info => {
            let mut categories: Vec<&str> = snapshot.iter().map(|c| c.name.as_str()).collect();
            categories.sort_unstable();
            serde_json::to_value(InfoView {
                name: &server.name,
                version: &server.version,
                description: "Capability gateway with discovery, introspection and request governance",
                total_tools,
                total_categories: snapshot.len(),
                features: FEATURES,
                categories,
            })?
        }
        ManifestView::Tools => serde_json::to_value(ToolsView {
            tool_categories: snapshot
                .iter()
                .map(|c| {
                    (
                        c.name.as_str(),
                        CategoryTools {
                            description: &c.description,
                            tools: &c.tools,
                        },
                    )
                })
                .collect(),
        })?,
        ManifestView::Categories => serde_json::to_value(CategoriesView {
            categories: snapshot
                .iter()
                .map(|c| {
                    (
                        c.name.as_str(),
                        CategorySummary {
                            description: &c.description,
                            tool_count: c.tool_count(),
                        },
                    )
                })
                .collect(),
            total_tools,
        })?,
    };
    Ok(value)
}

/// Builds manifest views on demand.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    introspector: Introspector,
    server: ServerConfig,
}

impl ManifestBuilder {
    pub fn new(introspector: Introspector, server: ServerConfig) -> Self {
        Self { introspector, server }
    }

    /// Re-run introspection and render the requested view.
    pub async fn build(&self, view: ManifestView) -> Result<Value> {
        let mut snapshot = self.introspector.snapshot().await;
        for category in &mut snapshot {
            category.tools.sort();
        }
        snapshot.sort_by(|a, b| a.name.cmp(&b.name));
        render(view, &self.server, &snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot() -> Vec<CategoryMetadata> {
        vec![
            CategoryMetadata {
                name: "crypto".to_string(),
                description: "Crypto tools: Generate bcrypt hash or verify password, Generate TOTP codes"
                    .to_string(),
                tools: vec!["bcrypt-hash".to_string(), "generate-otp".to_string()],
            },
            CategoryMetadata {
                name: "text".to_string(),
                description: "Convert text case".to_string(),
                tools: vec!["lower".to_string()],
            },
        ]
    }

    fn server() -> ServerConfig {
        ServerConfig {
            name: "toolgate".to_string(),
            version: "1.2.3".to_string(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_view_parsing() {
        for view in ManifestView::ALL {
            assert_eq!(view.as_str().parse::<ManifestView>().unwrap(), view);
        }
        assert!(matches!("docs".parse::<ManifestView>(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_tools_view() {
        let value = render(ManifestView::Tools, &server(), &snapshot()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "toolCategories": {
                    "crypto": {
                        "description": "Crypto tools: Generate bcrypt hash or verify password, Generate TOTP codes",
                        "tools": ["bcrypt-hash", "generate-otp"],
                    },
                    "text": {
                        "description": "Convert text case",
                        "tools": ["lower"],
                    },
                }
            })
        );
    }

    #[test]
    fn test_categories_view() {
        let value = render(ManifestView::Categories, &server(), &snapshot()).unwrap();
        assert_eq!(value["totalTools"], 3);
        assert_eq!(value["categories"]["crypto"]["toolCount"], 2);
        assert_eq!(value["categories"]["text"]["toolCount"], 1);
    }

    #[test]
    fn test_info_view() {
        let value = render(ManifestView::Info, &server(), &snapshot()).unwrap();
        assert_eq!(value["name"], "toolgate");
        assert_eq!(value["version"], "1.2.3");
        assert_eq!(value["totalTools"], 3);
        assert_eq!(value["totalCategories"], 2);
        assert_eq!(value["categories"], serde_json::json!(["crypto", "text"]));
        assert_eq!(value["features"].as_array().unwrap().len(), FEATURES.len());
    }

    #[test]
    fn test_empty_snapshot() {
        let value = render(ManifestView::Info, &server(), &[]).unwrap();
        assert_eq!(value["totalTools"], 0);
        let value = render(ManifestView::Tools, &server(), &[]).unwrap();
        assert_eq!(value, serde_json::json!({ "toolCategories": {} }));
    }
}
