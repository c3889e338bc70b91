//! 脚本化传输（用于测试，无需 MCP 服务端）
//!
//! `initialize` 默认返回带会话头的成功响应，`notifications/initialized` 返回 202，
//! `tools/call` 依次弹出预置响应；所有请求都会被记录，便于断言 id 与会话头。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use serde_json::{json, Value};

use crate::mcp::jsonrpc::{METHOD_INITIALIZE, METHOD_INITIALIZED};
use crate::mcp::transport::{HttpReply, McpTransport, SESSION_HEADER};
use crate::mcp::McpError;

pub const TEST_SESSION_ID: &str = "test-session";

/// 预置的一次 HTTP 响应
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub chunks: Vec<Bytes>,
}

impl ScriptedReply {
    pub fn raw(status: u16, content_type: &str, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            chunks: vec![Bytes::from(body.to_string())],
        }
    }

    pub fn json(status: u16, value: Value) -> Self {
        Self::raw(status, "application/json", &value.to_string())
    }

    /// 每条消息一个 `event: message` + `data:` 帧
    pub fn sse(messages: &[Value]) -> Self {
        let body: String = messages
            .iter()
            .map(|m| format!("event: message\ndata: {}\n\n", m))
            .collect();
        Self::raw(200, "text/event-stream", &body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::raw(status, "text/plain", body)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// 把响应体重新切成固定大小的块，模拟网络分包
    pub fn chunked(mut self, size: usize) -> Self {
        let all: Vec<u8> = self.chunks.iter().flat_map(|c| c.iter().copied()).collect();
        self.chunks = all
            .chunks(size.max(1))
            .map(Bytes::copy_from_slice)
            .collect();
        self
    }

    fn into_http(self) -> HttpReply {
        let chunks: Vec<Result<Bytes, McpError>> = self.chunks.into_iter().map(Ok).collect();
        HttpReply {
            status: self.status,
            headers: self.headers,
            body: Box::pin(stream::iter(chunks)),
        }
    }
}

/// 一次被记录的请求
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub body: Value,
    pub session_id: Option<String>,
}

pub struct ScriptedTransport {
    initialize: ScriptedReply,
    calls: Mutex<VecDeque<ScriptedReply>>,
    default_call: Option<ScriptedReply>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        let initialize = ScriptedReply::json(
            200,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": "mitre-mcp", "version": "test"}
                }
            }),
        )
        .with_header(SESSION_HEADER, TEST_SESSION_ID);
        Self {
            initialize,
            calls: Mutex::new(VecDeque::new()),
            default_call: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_initialize(mut self, reply: ScriptedReply) -> Self {
        self.initialize = reply;
        self
    }

    /// 追加一个 tools/call 响应（按调用顺序弹出）
    pub fn with_call(self, reply: ScriptedReply) -> Self {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
        self
    }

    /// 预置队列耗尽后使用的响应
    pub fn with_default_call(mut self, reply: ScriptedReply) -> Self {
        self.default_call = Some(reply);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn count_method(&self, method: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.body["method"] == method)
            .count()
    }

    /// 所有请求中出现过的 id（按发送顺序）
    pub fn request_ids(&self) -> Vec<u64> {
        self.requests()
            .iter()
            .filter_map(|r| r.body.get("id").and_then(Value::as_u64))
            .collect()
    }

    fn next_call(&self) -> ScriptedReply {
        let queued = self
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        queued
            .or_else(|| self.default_call.clone())
            .unwrap_or_else(|| ScriptedReply::status(500, "no scripted reply"))
    }
}

#[async_trait]
impl McpTransport for ScriptedTransport {
    async fn post(&self, body: &Value, session_id: Option<&str>) -> Result<HttpReply, McpError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedRequest {
                body: body.clone(),
                session_id: session_id.map(str::to_string),
            });

        let reply = match body["method"].as_str() {
            Some(METHOD_INITIALIZE) => self.initialize.clone(),
            Some(METHOD_INITIALIZED) => ScriptedReply {
                status: 202,
                headers: Vec::new(),
                chunks: Vec::new(),
            },
            _ => self.next_call(),
        };
        Ok(reply.into_http())
    }
}
