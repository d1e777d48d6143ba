//! Test a regular expression against text, behind the backtracking guard.

use serde_json::Value;

use crate::governance::{compile_guarded, ValidationKind};
use crate::tools::{
    handler_fn, str_arg, Arguments, ParamDef, ToolDescriptor, ToolFault, ToolOutput, ToolRegistrar,
};
use crate::types::Result;

/// Matches reported per call.
const MAX_MATCHES: usize = 100;

pub fn register_regex_test(registrar: &mut dyn ToolRegistrar) -> Result<()> {
    let descriptor = ToolDescriptor::new("regex-test", "Test a regular expression against text")
        .param(ParamDef::text("pattern", ValidationKind::RegexPattern, "Regular expression"))
        .param(ParamDef::text("text", ValidationKind::Text, "Text to search"))
        .title("Regex test")
        .read_only(true);
    registrar.register_tool(descriptor, handler_fn(test_pattern))
}

async fn test_pattern(args: Arguments) -> std::result::Result<ToolOutput, ToolFault> {
    let pattern = str_arg(&args, "pattern")?;
    let text = str_arg(&args, "text")?;

    let re = compile_guarded(pattern).map_err(|v| ToolFault::rejected(v.to_string()))?;
    let matches: Vec<Value> = re
        .find_iter(text)
        .take(MAX_MATCHES)
        .map(|m| {
            serde_json::json!({
                "match": m.as_str(),
                "start": m.start(),
                "end": m.end(),
            })
        })
        .collect();

    let body = serde_json::json!({
        "matched": !matches.is_empty(),
        "matches": matches,
    });
    Ok(ToolOutput::text(body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_reports_matches() {
        let out = test_pattern(args(serde_json::json!({"pattern": r"\d+", "text": "a1 b22"})))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&out.joined_text()).unwrap();
        assert_eq!(body["matched"], true);
        assert_eq!(body["matches"][1]["match"], "22");
        assert_eq!(body["matches"][1]["start"], 4);
    }

    #[tokio::test]
    async fn test_no_match() {
        let out = test_pattern(args(serde_json::json!({"pattern": "z", "text": "abc"})))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&out.joined_text()).unwrap();
        assert_eq!(body["matched"], false);
    }

    #[tokio::test]
    async fn test_nested_quantifier_rejected() {
        let err = test_pattern(args(serde_json::json!({"pattern": "(a+)+$", "text": "aaaa"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolFault::Rejected(msg) if msg.contains("unsafe pattern")));
    }
}
