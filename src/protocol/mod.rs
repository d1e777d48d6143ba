//! JSON-RPC protocol surface over newline-delimited JSON.
//!
//! `codec` frames lines, `router` maps methods onto the gateway, `server`
//! runs the read loop for one connection.

pub mod codec;
pub mod router;
pub mod server;

pub use router::{Gateway, MANIFEST_URI_PREFIX, PROTOCOL_VERSION};
pub use server::Server;
