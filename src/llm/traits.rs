//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 ToolCallingLlm：给定用户输入与可用工具，
//! 返回「调用某工具」或「直接文本回复」。

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::tools::ToolDescriptor;

/// LLM 的一次回复
#[derive(Debug, Clone, PartialEq)]
pub enum LlmReply {
    /// 模型决定调用工具（arguments 已解析为 JSON）
    ToolCall { name: String, arguments: Value },
    /// 模型直接回复文本
    Text(String),
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM API error: {0}")]
    Api(String),

    #[error("Malformed tool call: {0}")]
    MalformedToolCall(String),

    #[error("LLM returned no choices")]
    Empty,
}

#[async_trait]
pub trait ToolCallingLlm: Send + Sync {
    async fn complete_with_tools(
        &self,
        prompt: &str,
        tools: &[ToolDescriptor],
    ) -> Result<LlmReply, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
