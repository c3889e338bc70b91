//! Scout - MITRE ATT&CK 工具调用智能体
//!
//! 模块划分：
//! - **agent**: LLM 选工具 → MCP 调用（ask_with_tools）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **extract**: ATT&CK STIX 数据抽取
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **mcp**: streamable HTTP 上的 JSON-RPC 工具调用客户端（会话、请求关联、SSE）
//! - **observability**: tracing 日志
//! - **tools**: 宣告给 LLM 的工具描述与参数 Schema
//! - **workflow**: 规划 → fan-out → 合并 流水线

pub mod agent;
pub mod config;
pub mod extract;
pub mod llm;
pub mod mcp;
pub mod observability;
pub mod tools;
pub mod workflow;

pub use mcp::{McpClient, McpError, ToolReply};
pub use workflow::{Pipeline, PipelineBuilder};
