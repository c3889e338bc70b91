//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Mock）

pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use crate::config::LlmSection;

pub use mock::MockLlmClient;
pub use openai::{parse_reply, OpenAiClient, TokenUsage};
pub use traits::{LlmError, LlmReply, ToolCallingLlm};

/// 根据配置与环境变量选择 LLM 后端：有 API Key 走 OpenAI 兼容端点，否则退回 Mock
pub fn create_llm_from_config(cfg: &LlmSection) -> Arc<dyn ToolCallingLlm> {
    let api_key = cfg
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok());

    match api_key {
        Some(key) => {
            tracing::info!("Using OpenAI LLM ({})", cfg.model);
            Arc::new(OpenAiClient::new(cfg.base_url.as_deref(), &cfg.model, Some(&key)))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, using Mock LLM");
            Arc::new(MockLlmClient::new())
        }
    }
}
