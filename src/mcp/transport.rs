//! HTTP 传输层
//!
//! `McpTransport` 把「POST 一条 JSON-RPC 信封」抽象出来：生产用 reqwest 实现 [`HttpTransport`]，
//! 测试用 [`crate::mcp::ScriptedTransport`]。响应体以字节流交给上层，SSE 可边读边匹配。

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

use crate::mcp::McpError;

/// 会话头（读取时大小写不敏感）
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

/// 同时接受单 JSON 与 SSE 两种响应编码
pub const ACCEPT_BOTH: &str = "application/json, text/event-stream";

pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, McpError>> + Send>>;

/// 一次 HTTP 响应：状态码、响应头、未读取的响应体
pub struct HttpReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: BodyStream,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 按名称查响应头，大小写不敏感
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> &str {
        self.header(CONTENT_TYPE.as_str()).unwrap_or("")
    }

    pub fn session_id(&self) -> Option<&str> {
        self.header(SESSION_HEADER).filter(|s| !s.is_empty())
    }

    /// 读完整个响应体为文本
    pub async fn text(mut self) -> Result<String, McpError> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// POST 一条 JSON-RPC 信封；`session_id` 存在时附带会话头
#[async_trait]
pub trait McpTransport: Send + Sync {
    async fn post(&self, body: &Value, session_id: Option<&str>) -> Result<HttpReply, McpError>;
}

/// reqwest 实现：固定端点，可选整体超时（默认不设超时）
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, McpError> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn post(&self, body: &Value, session_id: Option<&str>) -> Result<HttpReply, McpError> {
        let mut request = self
            .client
            .post(&self.url)
            .header(ACCEPT, ACCEPT_BOTH)
            .json(body);
        if let Some(id) = session_id {
            request = request.header(SESSION_HEADER, id);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body: BodyStream = Box::pin(response.bytes_stream().map(|chunk| chunk.map_err(McpError::from)));

        Ok(HttpReply {
            status,
            headers,
            body,
        })
    }
}
