//! Base64 encoding of UTF-8 text.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use serde_json::Value;

use crate::governance::ValidationKind;
use crate::tools::{
    handler_fn, str_arg, Arguments, ParamDef, ParamType, ToolDescriptor, ToolFault, ToolOutput,
    ToolRegistrar,
};
use crate::types::Result;

pub fn register_base64_encode(registrar: &mut dyn ToolRegistrar) -> Result<()> {
    let descriptor = ToolDescriptor::new("base64-encode", "Encode text as base64")
        .param(ParamDef::text("text", ValidationKind::Text, "Text to encode"))
        .param(
            ParamDef::new("url_safe", ParamType::Bool, "Use the URL-safe alphabet")
                .with_default(Value::Bool(false)),
        )
        .title("Base64 encode")
        .read_only(true);
    registrar.register_tool(descriptor, handler_fn(encode))
}

async fn encode(args: Arguments) -> std::result::Result<ToolOutput, ToolFault> {
    let text = str_arg(&args, "text")?;
    let url_safe = args.get("url_safe").and_then(Value::as_bool).unwrap_or(false);
    let encoded = if url_safe {
        URL_SAFE.encode(text)
    } else {
        STANDARD.encode(text)
    };
    Ok(ToolOutput::text(encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_standard_alphabet() {
        let out = encode(args(serde_json::json!({"text": "hello world"}))).await.unwrap();
        assert_eq!(out.joined_text(), "aGVsbG8gd29ybGQ=");
    }

    #[tokio::test]
    async fn test_url_safe_alphabet() {
        let out = encode(args(serde_json::json!({"text": "??>", "url_safe": true})))
            .await
            .unwrap();
        assert_eq!(out.joined_text(), "Pz8-");
    }
}
