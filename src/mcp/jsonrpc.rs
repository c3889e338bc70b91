//! JSON-RPC 2.0 信封
//!
//! 出站：Request（带 id，期待响应）、Notification（无 id，发完即忘）；
//! 入站消息保持为 `serde_json::Value`，由 decode 模块按 id 关联后转为 [`ToolReply`]。

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// 出站请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// 出站通知：没有 id，服务端不回响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// `initialize` 的 clientInfo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: "simple-client".to_string(),
            version: "0.1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: Value,
    pub client_info: ClientInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Value,
}

/// 请求 id 分配器：从 1 开始单调递增，多任务共享时依然唯一
#[derive(Debug)]
pub struct RequestIds {
    next: AtomicU64,
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestIds {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// 一次 tools/call 的结果：成功载荷或工具级错误载荷，二者只居其一
#[derive(Debug, Clone, PartialEq)]
pub enum ToolReply {
    Result(Value),
    Error(Value),
}

impl ToolReply {
    /// 从 JSON-RPC 消息中取 result / error；两者都没有时返回 None
    pub fn from_message(message: &Value) -> Option<Self> {
        if let Some(result) = message.get("result") {
            return Some(ToolReply::Result(result.clone()));
        }
        message.get("error").map(|e| ToolReply::Error(e.clone()))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolReply::Error(_))
    }

    pub fn into_result(self) -> Result<Value, Value> {
        match self {
            ToolReply::Result(v) => Ok(v),
            ToolReply::Error(e) => Err(e),
        }
    }
}

/// 消息 id 是否等于 `expected`（数字或数字字符串都接受）
pub fn id_matches(message: &Value, expected: u64) -> bool {
    match message.get("id") {
        Some(Value::Number(n)) => n.as_u64() == Some(expected),
        Some(Value::String(s)) => s.parse::<u64>().ok() == Some(expected),
        _ => false,
    }
}
