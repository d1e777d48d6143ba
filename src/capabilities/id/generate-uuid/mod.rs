//! Random (v4) UUID generation.

use serde_json::Value;
use uuid::Uuid;

use crate::tools::{
    handler_fn, Arguments, ParamDef, ParamType, ToolDescriptor, ToolFault, ToolOutput, ToolRegistrar,
};
use crate::types::Result;

const MAX_COUNT: u64 = 100;

pub fn register_generate_uuid(registrar: &mut dyn ToolRegistrar) -> Result<()> {
    let descriptor = ToolDescriptor::new("generate-uuid", "Generate random v4 UUIDs")
        .param(
            ParamDef::new("count", ParamType::Int, "How many UUIDs to generate (1-100)")
                .with_default(Value::from(1)),
        )
        .title("Generate UUID");
    registrar.register_tool(descriptor, handler_fn(generate))
}

async fn generate(args: Arguments) -> std::result::Result<ToolOutput, ToolFault> {
    let count = match args.get("count").and_then(Value::as_u64) {
        Some(n) if (1..=MAX_COUNT).contains(&n) => n,
        None if !args.contains_key("count") => 1,
        _ => {
            return Err(ToolFault::rejected(format!(
                "count must be between 1 and {}",
                MAX_COUNT
            )))
        }
    };
    let ids: Vec<String> = (0..count).map(|_| Uuid::new_v4().to_string()).collect();
    Ok(ToolOutput::text(ids.join("\n")))
}
