//! Tool infrastructure: descriptors, registry, discovery, introspection,
//! manifests.
//!
//! Capability bodies live in `crate::capabilities`; this module owns how they
//! are found, registered and described.

pub mod catalog;
pub mod introspect;
pub mod loader;
pub mod manifest;
pub mod registry;
pub mod scan;

pub use catalog::{ParamDef, ParamType, ToolAnnotations, ToolDescriptor};
pub use introspect::{CategoryMetadata, Introspector};
pub use loader::{CapabilityLoader, EntryPoint, LoadError, LoadReport, ModuleRecord};
pub use manifest::{ManifestBuilder, ManifestView};
pub use registry::{
    handler_fn, str_arg, Arguments, BoxedHandler, ContentBlock, RecordingRegistrar, RegisterFn,
    RegisteredTool, ToolFault, ToolHandler, ToolOutput, ToolRegistrar, ToolRegistry,
};
