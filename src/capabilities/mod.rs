//! Built-in capabilities.
//!
//! Layout is `<category>/<tool>/mod.rs`, one public `register_*` function per
//! tool module. `build.rs` walks this directory and generates the module
//! declarations plus the [`MODULES`] table; nothing here is listed by hand.

#[allow(unused_imports)]
use crate::tools::loader::{EntryPoint, ModuleRecord};

include!(concat!(env!("OUT_DIR"), "/capability_table.rs"));
