//! SHA-256 digest of text, hex encoded.

use sha2::{Digest, Sha256};

use crate::governance::ValidationKind;
use crate::tools::{
    handler_fn, str_arg, Arguments, ParamDef, ToolDescriptor, ToolFault, ToolOutput, ToolRegistrar,
};
use crate::types::Result;

pub fn register_sha256_digest(registrar: &mut dyn ToolRegistrar) -> Result<()> {
    let descriptor = ToolDescriptor::new("sha256-digest", "Compute the SHA-256 digest of text")
        .param(ParamDef::text("text", ValidationKind::Text, "Text to hash"))
        .title("SHA-256")
        .read_only(true);
    registrar.register_tool(descriptor, handler_fn(digest))
}

async fn digest(args: Arguments) -> std::result::Result<ToolOutput, ToolFault> {
    let text = str_arg(&args, "text")?;
    Ok(ToolOutput::text(hex::encode(Sha256::digest(text.as_bytes()))))
}
