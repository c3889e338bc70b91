//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 未预置回复时：选第一个工具，必填的字符串参数填入用户输入的首行，其余参数取默认值，
//! 便于本地不配置 API Key 也能跑通「LLM 选工具 → MCP 调用」流程。

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::llm::{LlmError, LlmReply, ToolCallingLlm};
use crate::tools::ToolDescriptor;

#[derive(Debug, Default)]
pub struct MockLlmClient {
    reply: Option<LlmReply>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 固定回复
    pub fn with_reply(reply: LlmReply) -> Self {
        Self { reply: Some(reply) }
    }
}

#[async_trait]
impl ToolCallingLlm for MockLlmClient {
    async fn complete_with_tools(
        &self,
        prompt: &str,
        tools: &[ToolDescriptor],
    ) -> Result<LlmReply, LlmError> {
        if let Some(reply) = &self.reply {
            return Ok(reply.clone());
        }

        let Some(tool) = tools.first() else {
            return Ok(LlmReply::Text(format!("Echo from Mock: {}", prompt.trim())));
        };

        let keyword: String = prompt
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
            .chars()
            .take(80)
            .collect();

        let mut arguments = Map::new();
        for p in &tool.params {
            if p.required && p.kind == "string" {
                arguments.insert(p.name.clone(), Value::String(keyword.clone()));
            } else if let Some(d) = &p.default {
                arguments.insert(p.name.clone(), d.clone());
            }
        }

        Ok(LlmReply::ToolCall {
            name: tool.name.clone(),
            arguments: Value::Object(arguments),
        })
    }
}
