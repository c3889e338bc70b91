//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）。请求与响应走 BYOT（自带 JSON 类型），
//! 工具列表直接使用注册表渲染出的 function tool JSON。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_openai::Client;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::{LlmError, LlmReply, ToolCallingLlm};
use crate::tools::ToolDescriptor;

/// Token 使用统计（累计值）
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: Arc<AtomicU64>,
    pub completion_tokens: Arc<AtomicU64>,
    pub total_tokens: Arc<AtomicU64>,
}

impl TokenUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
        self.total_tokens.fetch_add(prompt + completion, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
            self.total_tokens.load(Ordering::Relaxed),
        )
    }
}

/// OpenAI 兼容客户端：持有 Client 与 model 名
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    /// 累计 token 使用统计
    pub usage: TokenUsage,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            usage: TokenUsage::new(),
        }
    }

    fn build_request(&self, prompt: &str, tools: &[ToolDescriptor]) -> Value {
        let mut request = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });
        if !tools.is_empty() {
            request["tools"] = Value::Array(tools.iter().map(ToolDescriptor::to_openai_tool).collect());
        }
        request
    }
}

#[async_trait]
impl ToolCallingLlm for OpenAiClient {
    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }

    async fn complete_with_tools(
        &self,
        prompt: &str,
        tools: &[ToolDescriptor],
    ) -> Result<LlmReply, LlmError> {
        let request = self.build_request(prompt, tools);
        let response: Value = self
            .client
            .chat()
            .create_byot(request)
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        // 提取 token 使用统计
        if let Some(usage) = response.get("usage") {
            let prompt_tokens = usage.get("prompt_tokens").and_then(Value::as_u64).unwrap_or(0);
            let completion_tokens = usage
                .get("completion_tokens")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            self.usage.add(prompt_tokens, completion_tokens);
        }

        parse_reply(&response)
    }
}

/// 解析 Chat Completions 响应：优先取第一个 tool call，否则取 content
pub fn parse_reply(response: &Value) -> Result<LlmReply, LlmError> {
    let message = response
        .pointer("/choices/0/message")
        .ok_or(LlmError::Empty)?;

    if let Some(function) = message.pointer("/tool_calls/0/function") {
        let name = function
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::MalformedToolCall("missing function name".to_string()))?;
        // arguments 是 JSON 字符串
        let raw = function.get("arguments").and_then(Value::as_str).unwrap_or("{}");
        let arguments: Value = serde_json::from_str(raw)
            .map_err(|e| LlmError::MalformedToolCall(format!("{}: {}", name, e)))?;
        return Ok(LlmReply::ToolCall {
            name: name.to_string(),
            arguments,
        });
    }

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Ok(LlmReply::Text(content.to_string()))
}
