//! HTML entity escaping and unescaping.

use serde_json::Value;

use crate::governance::{escape_html, unescape_html, SanitizeMode, ValidationKind};
use crate::tools::{
    handler_fn, str_arg, Arguments, ParamDef, ParamType, ToolDescriptor, ToolFault, ToolOutput,
    ToolRegistrar,
};
use crate::types::Result;

pub fn register_html_escape(registrar: &mut dyn ToolRegistrar) -> Result<()> {
    let descriptor = ToolDescriptor::new("html-escape", "Escape or unescape HTML entities")
        .param(
            ParamDef::text("text", ValidationKind::Html, "Text to transform")
                .with_sanitize(SanitizeMode::Text),
        )
        .param(
            ParamDef::new(
                "mode",
                ParamType::Enum(vec!["escape".to_string(), "unescape".to_string()]),
                "Direction of the transform",
            )
            .with_default(Value::from("escape")),
        )
        .title("HTML escape")
        .read_only(true);
    registrar.register_tool(descriptor, handler_fn(transform))
}

async fn transform(args: Arguments) -> std::result::Result<ToolOutput, ToolFault> {
    let text = str_arg(&args, "text")?;
    let out = match args.get("mode").and_then(Value::as_str) {
        Some("unescape") => unescape_html(text),
        _ => escape_html(text),
    };
    Ok(ToolOutput::text(out))
}
