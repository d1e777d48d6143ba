//! Base64 decoding back to UTF-8 text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::governance::ValidationKind;
use crate::tools::{
    handler_fn, str_arg, Arguments, ParamDef, ToolDescriptor, ToolFault, ToolOutput, ToolRegistrar,
};
use crate::types::Result;

pub fn register_base64_decode(registrar: &mut dyn ToolRegistrar) -> Result<()> {
    let descriptor = ToolDescriptor::new("base64-decode", "Decode base64 to text")
        .param(ParamDef::text("data", ValidationKind::Base64, "Standard-alphabet base64"))
        .title("Base64 decode")
        .read_only(true);
    registrar.register_tool(descriptor, handler_fn(decode))
}

async fn decode(args: Arguments) -> std::result::Result<ToolOutput, ToolFault> {
    let data = str_arg(&args, "data")?;
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| ToolFault::rejected(format!("Input is not valid base64: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| ToolFault::rejected("Decoded bytes are not valid UTF-8"))?;
    Ok(ToolOutput::text(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_decode() {
        let out = decode(args(serde_json::json!({"data": "aGVsbG8gd29ybGQ="}))).await.unwrap();
        assert_eq!(out.joined_text(), "hello world");
    }

    #[tokio::test]
    async fn test_bad_padding_rejected() {
        let err = decode(args(serde_json::json!({"data": "aGVsbG8"}))).await.unwrap_err();
        assert!(matches!(err, ToolFault::Rejected(msg) if msg.starts_with("Input is not valid base64")));
    }

    #[tokio::test]
    async fn test_non_utf8_rejected() {
        // 0xFF 0xFE
        let err = decode(args(serde_json::json!({"data": "//4="}))).await.unwrap_err();
        assert!(matches!(err, ToolFault::Rejected(msg) if msg.contains("UTF-8")));
    }
}
