//! Core types for the toolgate gateway.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (SessionId)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for server, rate limiting and loading

mod config;
mod errors;
mod ids;

pub use config::{
    Config, DuplicatePolicy, LoaderConfig, ObservabilityConfig, RateLimitConfig, ServerConfig,
};
pub use errors::{rpc_code, Error, Result};
pub use ids::SessionId;
