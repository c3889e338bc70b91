//! MCP 客户端错误类型
//!
//! 传输错误（非 2xx）、协议错误（意外 Content-Type / SSE 流结束仍无匹配消息）均为单次调用致命；
//! 工具级错误（JSON-RPC `error` 字段）不在此处，作为 `ToolReply::Error` 数据返回给调用方。

use thiserror::Error;

#[derive(Error, Debug)]
pub enum McpError {
    /// 服务端返回非成功状态码
    #[error("HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected Content-Type: {content_type} (status {status})")]
    UnexpectedContentType { status: u16, content_type: String },

    /// SSE 流结束但没有收到与请求 id 对应的 result / error
    #[error("No JSON-RPC result received on SSE stream for request {id}")]
    NoResult { id: u64 },

    #[error("Response id mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: u64, actual: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for McpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            McpError::Timeout
        } else {
            McpError::Http(e.to_string())
        }
    }
}

impl McpError {
    /// 是否为协议层错误（编码不符或流中无匹配消息）
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            McpError::UnexpectedContentType { .. } | McpError::NoResult { .. } | McpError::IdMismatch { .. }
        )
    }
}
