//! # Toolgate Core - Governed Capability Gateway
//!
//! Rust implementation of a tool gateway providing:
//! - Filesystem-organized capability discovery (build-time module table)
//! - Side-effect-free metadata introspection and manifest views
//! - Per-caller sliding-window rate limiting
//! - Input validation, regex backtracking guard and text sanitization
//! - JSON-RPC 2.0 protocol surface over newline-delimited JSON
//!
//! ## Architecture
//!
//! Every call crosses the governance layer before a tool body runs:
//! ```text
//!                     ┌───────────────────────────────────┐
//!   JSON-RPC lines →  │            Gateway                │
//!                     │  ┌──────────┐   ┌──────────────┐  │
//!                     │  │ Manifest │   │SecureHandler │  │
//!                     │  │ Builder  │   │ limit→check  │  │
//!                     │  └────┬─────┘   └──────┬───────┘  │
//!                     │  ┌────┴─────┐   ┌──────┴───────┐  │
//!                     │  │Introspect│   │ ToolRegistry │  │
//!                     │  └────┬─────┘   └──────┬───────┘  │
//!                     └───────┼────────────────┼──────────┘
//!                             └── capabilities ┘
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod capabilities;
pub mod governance;
pub mod protocol;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;

pub use types::{Config, Error, Result};
