//! 工具参数 Schema（schemars 从参数结构体自动生成）
//!
//! 参数结构体的字段文档即参数描述，`#[serde(default)]` 即默认值与「非必填」；
//! 生成的 JSON Schema 再拆成 [`ParamSpec`] 表，供注册表渲染给 LLM。

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

fn default_domain() -> String {
    "enterprise".to_string()
}

/// get_objects_by_content 参数
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObjectsByContentArgs {
    /// Text to search for in object descriptions
    pub content: String,
    /// STIX object type (e.g. 'attack-pattern','malware',…)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// Domain ('enterprise', 'mobile', or 'ics')
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Whether to return each object's description
    #[serde(default)]
    pub include_description: bool,
}

/// get_all_techniques 参数
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AllTechniquesArgs {
    /// Domain ('enterprise', 'mobile', or 'ics')
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Whether to return each object's description
    #[serde(default)]
    pub include_description: bool,
}

/// get_techniques_by_tactic 参数（编排流水线的 worker 使用）
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TacticQuery {
    /// ATT&CK tactic name (e.g. 'persistence')
    pub tactic: String,
    /// Whether to return each object's description
    #[serde(default)]
    pub include_description: bool,
}

/// 单个参数的描述
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    /// JSON 类型名（string / boolean / integer ...）
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub required: bool,
}

/// 从参数结构体生成参数表
pub fn params_for<A: JsonSchema>() -> Vec<ParamSpec> {
    let root = serde_json::to_value(schema_for!(A)).unwrap_or_default();
    params_from_schema(&root)
}

/// 从对象型 JSON Schema（properties + required）拆出参数表
pub fn params_from_schema(schema: &Value) -> Vec<ParamSpec> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    properties
        .iter()
        .map(|(name, prop)| ParamSpec {
            name: name.clone(),
            kind: json_type(prop),
            description: prop
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            default: prop.get("default").filter(|d| !d.is_null()).cloned(),
            required: required.contains(&name.as_str()),
        })
        .collect()
}

// Option<T> 生成 ["string", "null"]，取第一个非 null 类型
fn json_type(prop: &Value) -> String {
    match prop.get("type") {
        Some(Value::String(t)) => t.clone(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .unwrap_or("string")
            .to_string(),
        _ => "string".to_string(),
    }
}

/// 把参数表渲染回 JSON Schema 对象
pub fn render_schema(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    for p in params {
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!(p.kind));
        if let Some(d) = &p.description {
            prop.insert("description".to_string(), json!(d));
        }
        if let Some(d) = &p.default {
            prop.insert("default".to_string(), d.clone());
        }
        properties.insert(p.name.clone(), Value::Object(prop));
    }
    let required: Vec<&str> = params
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(params: &'a [ParamSpec], name: &str) -> &'a ParamSpec {
        params.iter().find(|p| p.name == name).unwrap()
    }

    #[test]
    fn test_objects_by_content_params() {
        let params = params_for::<ObjectsByContentArgs>();
        assert_eq!(params.len(), 4);

        let content = find(&params, "content");
        assert_eq!(content.kind, "string");
        assert!(content.required);
        assert_eq!(
            content.description.as_deref(),
            Some("Text to search for in object descriptions")
        );

        let object_type = find(&params, "object_type");
        assert_eq!(object_type.kind, "string");
        assert!(!object_type.required);
        assert_eq!(object_type.default, None);

        let domain = find(&params, "domain");
        assert_eq!(domain.default, Some(json!("enterprise")));
        assert!(!domain.required);

        let include = find(&params, "include_description");
        assert_eq!(include.kind, "boolean");
        assert_eq!(include.default, Some(json!(false)));
    }

    #[test]
    fn test_args_deserialize_with_defaults() {
        let args: ObjectsByContentArgs = serde_json::from_value(json!({"content": "ssh"})).unwrap();
        assert_eq!(args.domain, "enterprise");
        assert!(!args.include_description);
        let v = serde_json::to_value(&args).unwrap();
        assert!(v.get("object_type").is_none());
    }

    #[test]
    fn test_render_schema_round_trips_required() {
        let params = params_for::<TacticQuery>();
        let schema = render_schema(&params);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["tactic"]));
        assert_eq!(schema["properties"]["tactic"]["type"], "string");
        assert_eq!(params_from_schema(&schema), params);
    }
}
