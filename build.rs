//! Generates the capability module table from `src/capabilities`.
//!
//! Output: `$OUT_DIR/capability_table.rs`, included by `src/capabilities/mod.rs`.
//! It declares one `mod` per tool directory that has an entry module and a
//! static `MODULES` table with one record per tool directory, in scan order.

#[path = "src/tools/scan.rs"]
#[allow(dead_code)]
mod scan;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
    let root = manifest_dir.join("src").join("capabilities");

    println!("cargo:rerun-if-changed={}", root.display());
    println!("cargo:rerun-if-changed=src/tools/scan.rs");

    let modules = scan::scan_capability_tree(&root)?;
    let mut out = String::new();
    writeln!(out, "// @generated by build.rs from {}", root.display())?;

    for module in &modules {
        // Directory-level changes are not always seen through the root entry.
        let tool_dir = root.join(&module.category).join(&module.tool);
        println!("cargo:rerun-if-changed={}", tool_dir.display());

        for extra in &module.extra_entry_fns {
            println!(
                "cargo:warning=capability {}/{} exposes extra entry point `{}`; using `{}`",
                module.category,
                module.tool,
                extra,
                module.entry_fn.as_deref().unwrap_or("?"),
            );
        }

        if let Some(path) = &module.entry_module {
            write_mod_decl(&mut out, path, &scan::module_ident(&module.category, &module.tool))?;
        }
    }

    writeln!(out)?;
    writeln!(out, "pub static MODULES: &[ModuleRecord] = &[")?;
    for module in &modules {
        let entry = match (&module.entry_module, &module.entry_fn) {
            (None, _) => "EntryPoint::MissingModule".to_string(),
            (Some(_), None) => "EntryPoint::NoEntryPoint".to_string(),
            (Some(_), Some(symbol)) => format!(
                "EntryPoint::Registered {{ symbol: {:?}, register: {}::{} }}",
                symbol,
                scan::module_ident(&module.category, &module.tool),
                symbol,
            ),
        };
        writeln!(
            out,
            "    ModuleRecord {{ category: {:?}, tool: {:?}, entry: {} }},",
            module.category, module.tool, entry
        )?;
    }
    writeln!(out, "];")?;

    let out_path = PathBuf::from(std::env::var("OUT_DIR")?).join("capability_table.rs");
    std::fs::write(out_path, out)?;

    Ok(())
}

fn write_mod_decl(out: &mut String, path: &Path, ident: &str) -> std::fmt::Result {
    let path = path.to_string_lossy();
    writeln!(out, "#[path = {:?}]", path)?;
    writeln!(out, "mod {};", ident)
}
