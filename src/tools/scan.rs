//! Capability tree scanner.
//!
//! Walks `<root>/<category>/<tool>/mod.rs` in lexicographic order and finds
//! each module's registration entry point. Shared verbatim with `build.rs`,
//! which turns the result into the generated module table, so this file may
//! only depend on `std`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of a tool's entry module.
pub const ENTRY_MODULE: &str = "mod.rs";

/// Name prefix identifying the registration entry point.
pub const ENTRY_PREFIX: &str = "register_";

/// One tool directory found under a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedModule {
    pub category: String,
    pub tool: String,
    /// Path of the entry module, `None` when the file is absent.
    pub entry_module: Option<PathBuf>,
    /// Entry point function name, `None` when the module exposes none.
    pub entry_fn: Option<String>,
    /// Additional entry points beyond the first (ignored, reported).
    pub extra_entry_fns: Vec<String>,
}

/// Sorted names of visible subdirectories.
fn sorted_subdirs(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        dirs.push((name, entry.path()));
    }
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}

/// Public functions named with [`ENTRY_PREFIX`], in source order.
pub fn find_entry_points(source: &str) -> Vec<String> {
    let mut found = Vec::new();
    for line in source.lines() {
        let line = line.trim_start();
        if line.starts_with("//") {
            continue;
        }
        let Some(rest) = line.strip_prefix("pub fn ") else {
            continue;
        };
        if !rest.starts_with(ENTRY_PREFIX) {
            continue;
        }
        let name: String = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if name.len() > ENTRY_PREFIX.len() {
            found.push(name);
        }
    }
    found
}

/// Scan a capability root. A missing root yields an empty list.
pub fn scan_capability_tree(root: &Path) -> io::Result<Vec<ScannedModule>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut modules = Vec::new();
    for (category, category_dir) in sorted_subdirs(root)? {
        for (tool, tool_dir) in sorted_subdirs(&category_dir)? {
            let entry_path = tool_dir.join(ENTRY_MODULE);
            let (entry_module, mut entry_fns) = if entry_path.is_file() {
                let source = fs::read_to_string(&entry_path)?;
                (Some(entry_path), find_entry_points(&source))
            } else {
                (None, Vec::new())
            };

            let entry_fn = if entry_fns.is_empty() {
                None
            } else {
                Some(entry_fns.remove(0))
            };

            modules.push(ScannedModule {
                category: category.clone(),
                tool,
                entry_module,
                entry_fn,
                extra_entry_fns: entry_fns,
            });
        }
    }
    Ok(modules)
}

/// Rust identifier for a generated `mod` item.
pub fn module_ident(category: &str, tool: &str) -> String {
    let mut ident = String::from("cap_");
    for c in category.chars().chain(std::iter::once('_')).chain(tool.chars()) {
        if c.is_ascii_alphanumeric() {
            ident.push(c.to_ascii_lowercase());
        } else {
            ident.push('_');
        }
    }
    ident
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    const ENTRY: &str = "pub fn register_tool(registrar: &mut dyn ToolRegistrar) -> Result<()> {\n    Ok(())\n}\n";

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let modules = scan_capability_tree(&dir.path().join("nope")).unwrap();
        assert!(modules.is_empty());
    }

    #[test]
    fn test_categories_and_tools_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "B/zeta/mod.rs", ENTRY);
        write(dir.path(), "B/alpha/mod.rs", ENTRY);
        write(dir.path(), "A/mid/mod.rs", ENTRY);

        let modules = scan_capability_tree(dir.path()).unwrap();
        let order: Vec<(String, String)> = modules
            .iter()
            .map(|m| (m.category.clone(), m.tool.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("A".to_string(), "mid".to_string()),
                ("B".to_string(), "alpha".to_string()),
                ("B".to_string(), "zeta".to_string()),
            ]
        );
        assert!(modules.iter().all(|m| m.entry_fn.as_deref() == Some("register_tool")));
    }

    #[test]
    fn test_missing_entry_module_keeps_siblings() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "crypto/bcrypt-hash/mod.rs", ENTRY);
        write(dir.path(), "crypto/broken/README.md", "no module here");
        write(dir.path(), "crypto/generate-otp/mod.rs", ENTRY);

        let modules = scan_capability_tree(dir.path()).unwrap();
        assert_eq!(modules.len(), 3);
        assert_eq!(modules[1].tool, "broken");
        assert!(modules[1].entry_module.is_none());
        assert!(modules[0].entry_fn.is_some());
        assert!(modules[2].entry_fn.is_some());
    }

    #[test]
    fn test_files_and_hidden_dirs_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "mod.rs", "// root module\n");
        write(dir.path(), "text/mod.rs", "// category file, not a tool\n");
        write(dir.path(), ".cache/x/mod.rs", ENTRY);
        write(dir.path(), "text/upper/mod.rs", ENTRY);

        let modules = scan_capability_tree(dir.path()).unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].tool, "upper");
    }

    #[test]
    fn test_find_entry_points() {
        let source = "\
use crate::x;
// pub fn register_commented(r: &mut dyn ToolRegistrar) {}
fn register_private() {}
pub fn helper() {}
pub fn register_first(r: &mut dyn ToolRegistrar) -> Result<()> { Ok(()) }
    pub fn register_second(r: &mut dyn ToolRegistrar) -> Result<()> { Ok(()) }
pub fn register_(r: &mut dyn ToolRegistrar) {}
";
        assert_eq!(find_entry_points(source), vec!["register_first", "register_second"]);
    }

    #[test]
    fn test_module_without_entry_point() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "text/noop/mod.rs", "pub fn helper() {}\n");
        let modules = scan_capability_tree(dir.path()).unwrap();
        assert!(modules[0].entry_module.is_some());
        assert!(modules[0].entry_fn.is_none());
    }

    #[test]
    fn test_module_ident() {
        assert_eq!(module_ident("crypto", "bcrypt-hash"), "cap_crypto_bcrypt_hash");
        assert_eq!(module_ident("Net", "dns.lookup"), "cap_net_dns_lookup");
    }
}
