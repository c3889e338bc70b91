//! 工具注册表
//!
//! 静态、只读的工具描述列表，只用于向 LLM 宣告能力；参数不在本地校验（由远端工具服务负责）。

use schemars::JsonSchema;
use serde_json::{json, Value};

use crate::tools::schema::{params_for, render_schema, AllTechniquesArgs, ObjectsByContentArgs, ParamSpec};

/// 工具描述：名称、描述（供 LLM 理解）、参数表
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// 以参数结构体的 Schema 构建描述
    pub fn for_args<A: JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: params_for::<A>(),
        }
    }

    pub fn parameters_schema(&self) -> Value {
        render_schema(&self.params)
    }

    /// OpenAI Chat Completions 的 function tool 格式
    pub fn to_openai_tool(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema(),
            }
        })
    }
}

/// 有序工具列表（宣告顺序即注册顺序）
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同名工具替换原有描述
    pub fn register(&mut self, tool: ToolDescriptor) {
        match self.tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

}

/// 宣告给 LLM 的 ATT&CK 工具（远端实际提供的工具更多）
pub fn attack_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ToolDescriptor::for_args::<ObjectsByContentArgs>(
        "get_objects_by_content",
        "Get MITRE ATT&CK objects by the content of their description",
    ));
    registry.register(ToolDescriptor::for_args::<AllTechniquesArgs>(
        "get_all_techniques",
        "Get all techniques in the MITRE ATT&CK framework",
    ));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_tools_order_and_params() {
        let registry = attack_tools();
        let names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["get_objects_by_content", "get_all_techniques"]);
        let all = registry.get("get_all_techniques").unwrap();
        assert_eq!(all.params.len(), 2);
        assert!(all.params.iter().all(|p| !p.required));
        assert!(registry.get("get_techniques_by_tactic").is_none());
    }

    #[test]
    fn test_openai_tool_shape() {
        let registry = attack_tools();
        let first = registry.tools()[0].to_openai_tool();
        assert_eq!(first["type"], "function");
        assert_eq!(first["function"]["name"], "get_objects_by_content");
        assert_eq!(first["function"]["parameters"]["type"], "object");
        assert_eq!(
            first["function"]["parameters"]["properties"]["domain"]["default"],
            "enterprise"
        );
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = attack_tools();
        registry.register(ToolDescriptor {
            name: "get_all_techniques".to_string(),
            description: "replaced".to_string(),
            params: Vec::new(),
        });
        assert_eq!(registry.tools().len(), 2);
        assert_eq!(registry.get("get_all_techniques").unwrap().description, "replaced");
    }
}
