//! Tool descriptors: typed metadata, input-constraint schema, parameter checks.
//!
//! A descriptor is everything about a tool except its executable body. The
//! same descriptor is produced whether a module registers against the live
//! registry or the recording registrar.

use crate::governance::{SanitizeMode, ValidationKind};
use crate::types::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

// =============================================================================
// Parameter types
// =============================================================================

/// Parameter type for tool inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Int,
    Float,
    Bool,
    StringList,
    Enum(Vec<String>),
    Optional(Box<ParamType>),
}

impl ParamType {
    /// Validate a JSON value against this parameter type.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            ParamType::String => {
                if value.is_string() {
                    Ok(())
                } else {
                    Err(format!("expected string, got {}", value_type_name(value)))
                }
            }
            ParamType::Int => {
                if value.is_i64() || value.is_u64() {
                    Ok(())
                } else {
                    Err(format!("expected integer, got {}", value_type_name(value)))
                }
            }
            ParamType::Float => {
                if value.is_number() {
                    Ok(())
                } else {
                    Err(format!("expected number, got {}", value_type_name(value)))
                }
            }
            ParamType::Bool => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(format!("expected boolean, got {}", value_type_name(value)))
                }
            }
            ParamType::StringList => {
                if let Some(arr) = value.as_array() {
                    for (i, item) in arr.iter().enumerate() {
                        if !item.is_string() {
                            return Err(format!(
                                "expected string at index {}, got {}",
                                i,
                                value_type_name(item)
                            ));
                        }
                    }
                    Ok(())
                } else {
                    Err(format!("expected array, got {}", value_type_name(value)))
                }
            }
            ParamType::Enum(variants) => {
                if let Some(s) = value.as_str() {
                    if variants.iter().any(|v| v == s) {
                        Ok(())
                    } else {
                        Err(format!(
                            "invalid enum value '{}', expected one of: {}",
                            s,
                            variants.join(", ")
                        ))
                    }
                } else {
                    Err(format!("expected string for enum, got {}", value_type_name(value)))
                }
            }
            ParamType::Optional(inner) => {
                if value.is_null() {
                    Ok(())
                } else {
                    inner.validate(value)
                }
            }
        }
    }

    /// JSON Schema fragment for protocol listings.
    pub fn json_schema(&self) -> Value {
        match self {
            ParamType::String => serde_json::json!({ "type": "string" }),
            ParamType::Int => serde_json::json!({ "type": "integer" }),
            ParamType::Float => serde_json::json!({ "type": "number" }),
            ParamType::Bool => serde_json::json!({ "type": "boolean" }),
            ParamType::StringList => {
                serde_json::json!({ "type": "array", "items": { "type": "string" } })
            }
            ParamType::Enum(variants) => serde_json::json!({ "type": "string", "enum": variants }),
            ParamType::Optional(inner) => inner.json_schema(),
        }
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Parameter definition
// =============================================================================

/// A single parameter constraint of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Validation rule applied to string values (and each item of string lists).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<ValidationKind>,
    /// Cleaning applied after validation succeeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitize: Option<SanitizeMode>,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            default: None,
            rule: None,
            sanitize: None,
        }
    }

    /// Required string parameter bound to a validation rule.
    pub fn text(name: impl Into<String>, rule: ValidationKind, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::String, description).with_rule(rule)
    }

    pub fn with_rule(mut self, rule: ValidationKind) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn with_sanitize(mut self, mode: SanitizeMode) -> Self {
        self.sanitize = Some(mode);
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none() && !matches!(self.param_type, ParamType::Optional(_))
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Hints for clients; never enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
}

/// Complete tool metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub id: String,
    pub description: String,
    pub parameters: Vec<ParamDef>,
    #[serde(default)]
    pub annotations: ToolAnnotations,
}

impl ToolDescriptor {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            parameters: Vec::new(),
            annotations: ToolAnnotations::default(),
        }
    }

    pub fn param(mut self, param: ParamDef) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.annotations.title = Some(title.into());
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.annotations.read_only_hint = Some(read_only);
        self
    }

    /// Reject descriptors no registrar should accept.
    pub fn check(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::validation("Tool id cannot be empty"));
        }
        let mut seen = std::collections::HashSet::new();
        for p in &self.parameters {
            if !seen.insert(p.name.as_str()) {
                return Err(Error::validation(format!(
                    "Tool '{}' declares parameter '{}' twice",
                    self.id, p.name
                )));
            }
        }
        Ok(())
    }

    /// Validate parameters against the declared schema.
    ///
    /// Returns a list of validation errors (empty = valid).
    pub fn validate_params(&self, params: &Map<String, Value>) -> Vec<String> {
        let mut errors = Vec::new();

        // Check required parameters are present
        for param_def in &self.parameters {
            if param_def.is_required() && !params.contains_key(&param_def.name) {
                errors.push(format!("Missing required parameter: {}", param_def.name));
            }
        }

        let known_names: HashMap<&str, &ParamDef> = self
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p))
            .collect();

        // Validate types of provided parameters
        for (key, value) in params {
            if let Some(param_def) = known_names.get(key.as_str()) {
                if let Err(e) = param_def.param_type.validate(value) {
                    errors.push(format!("Parameter '{}': {}", key, e));
                }
            } else {
                errors.push(format!("Unknown parameter: {}", key));
            }
        }

        errors.sort();
        errors
    }

    /// Fill in default values for missing optional parameters.
    pub fn fill_defaults(&self, params: &mut Map<String, Value>) {
        for param_def in &self.parameters {
            if !params.contains_key(&param_def.name) {
                if let Some(default) = &param_def.default {
                    params.insert(param_def.name.clone(), default.clone());
                }
            }
        }
    }

    /// JSON Schema object describing the input arguments.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for p in &self.parameters {
            let mut schema = p.param_type.json_schema();
            if let Some(obj) = schema.as_object_mut() {
                obj.insert("description".to_string(), Value::String(p.description.clone()));
                if let Some(default) = &p.default {
                    obj.insert("default".to_string(), default.clone());
                }
                if let Some(rule) = p.rule {
                    let max = rule.rule().max_len;
                    let key = if matches!(p.param_type, ParamType::StringList) {
                        "x-maxItemLength"
                    } else {
                        "maxLength"
                    };
                    obj.insert(key.to_string(), Value::from(max));
                }
            }
            if p.is_required() {
                required.push(Value::String(p.name.clone()));
            }
            properties.insert(p.name.clone(), schema);
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_descriptor() -> ToolDescriptor {
        ToolDescriptor::new("search_text", "Search text for a pattern")
            .param(ParamDef::text("pattern", ValidationKind::RegexPattern, "Pattern"))
            .param(
                ParamDef::new(
                    "max_results",
                    ParamType::Optional(Box::new(ParamType::Int)),
                    "Maximum results",
                )
                .with_default(serde_json::json!(10)),
            )
            .title("Search")
            .read_only(true)
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_check_rejects_empty_id() {
        assert!(ToolDescriptor::new("", "x").check().is_err());
        assert!(ToolDescriptor::new("  ", "x").check().is_err());
        assert!(sample_descriptor().check().is_ok());
    }

    #[test]
    fn test_check_rejects_duplicate_param() {
        let d = ToolDescriptor::new("t", "x")
            .param(ParamDef::new("a", ParamType::String, ""))
            .param(ParamDef::new("a", ParamType::Int, ""));
        assert!(d.check().is_err());
    }

    #[test]
    fn test_validate_params_valid() {
        let errors = sample_descriptor().validate_params(&args(serde_json::json!({"pattern": "a+"})));
        assert!(errors.is_empty(), "Expected no errors, got: {:?}", errors);
    }

    #[test]
    fn test_validate_params_missing_required() {
        let errors = sample_descriptor().validate_params(&Map::new());
        assert_eq!(errors, vec!["Missing required parameter: pattern"]);
    }

    #[test]
    fn test_validate_params_wrong_type_and_unknown() {
        let errors = sample_descriptor()
            .validate_params(&args(serde_json::json!({"pattern": 42, "bogus": true})));
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("expected string")));
        assert!(errors.iter().any(|e| e.contains("Unknown parameter: bogus")));
    }

    #[test]
    fn test_fill_defaults_no_overwrite() {
        let d = sample_descriptor();
        let mut params = args(serde_json::json!({"pattern": "x"}));
        d.fill_defaults(&mut params);
        assert_eq!(params["max_results"], 10);

        let mut params = args(serde_json::json!({"pattern": "x", "max_results": 5}));
        d.fill_defaults(&mut params);
        assert_eq!(params["max_results"], 5);
    }

    #[test]
    fn test_input_schema() {
        let schema = sample_descriptor().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["pattern"]["type"], "string");
        assert_eq!(schema["properties"]["pattern"]["maxLength"], 1_000);
        assert_eq!(schema["properties"]["max_results"]["default"], 10);
        assert_eq!(schema["required"], serde_json::json!(["pattern"]));
    }

    #[test]
    fn test_annotations_serialize_camel_case() {
        let value = serde_json::to_value(&sample_descriptor().annotations).unwrap();
        assert_eq!(value, serde_json::json!({"title": "Search", "readOnlyHint": true}));
    }

    #[test]
    fn test_param_type_enum_validation() {
        let pt = ParamType::Enum(vec!["asc".to_string(), "desc".to_string()]);
        assert!(pt.validate(&serde_json::json!("asc")).is_ok());
        assert!(pt.validate(&serde_json::json!("bad")).is_err());
        assert!(pt.validate(&serde_json::json!(42)).is_err());
    }

    #[test]
    fn test_param_type_string_list_validation() {
        let pt = ParamType::StringList;
        assert!(pt.validate(&serde_json::json!(["a", "b"])).is_ok());
        assert!(pt.validate(&serde_json::json!([1, 2])).is_err());
        assert!(pt.validate(&serde_json::json!("not array")).is_err());
    }
}
