//! 响应解码：按 Content-Type 选择编码，每种编码一个解码函数
//!
//! - `application/json`：整包解析，取 `result`，没有信封时返回整个文档
//! - `text/event-stream`：逐行读取 `data:` 帧，取第一条 id 匹配且带 result / error 的消息

use futures_util::StreamExt;
use serde_json::Value;

use crate::mcp::jsonrpc::{id_matches, ToolReply};
use crate::mcp::transport::BodyStream;
use crate::mcp::McpError;

/// 响应编码（由 Content-Type 决定）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseEncoding {
    Json,
    EventStream,
}

impl ResponseEncoding {
    /// 前缀匹配，忽略 `; charset=...` 等参数；其他类型返回 None
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Some(ResponseEncoding::Json),
            "text/event-stream" => Some(ResponseEncoding::EventStream),
            _ => None,
        }
    }
}

/// 单 JSON 文档
///
/// 带 `result` 时取 `result`；带 `error` 时只返回 `error` 对象（工具级错误按数据处理）；
/// 两者都没有时整个文档作为结果。只有 JSON-RPC 信封（含 `jsonrpc` / `result` / `error`）才校验 id，
/// 裸文档里的 `id`（如 STIX 对象的 `attack-pattern--…`）属于载荷本身。
pub async fn decode_json(body: BodyStream, request_id: u64) -> Result<ToolReply, McpError> {
    let mut lines = LineReader::new(body);
    let raw = lines.read_to_end().await?;
    let doc: Value = serde_json::from_slice(&raw)?;

    if is_envelope(&doc) {
        if let Some(id) = doc.get("id").filter(|id| !id.is_null()) {
            if !id_matches(&doc, request_id) {
                return Err(McpError::IdMismatch {
                    expected: request_id,
                    actual: id.to_string(),
                });
            }
        }
    }

    Ok(ToolReply::from_message(&doc).unwrap_or(ToolReply::Result(doc)))
}

fn is_envelope(doc: &Value) -> bool {
    ["jsonrpc", "result", "error"]
        .iter()
        .any(|key| doc.get(key).is_some())
}

/// SSE 流：不相关的消息（服务端通知、其他 id）直接跳过
pub async fn decode_event_stream(body: BodyStream, request_id: u64) -> Result<ToolReply, McpError> {
    let mut lines = LineReader::new(body);
    while let Some(line) = lines.next_line().await? {
        let Some(payload) = data_payload(&line) else {
            continue;
        };
        let message: Value = serde_json::from_str(payload)?;
        if !id_matches(&message, request_id) {
            tracing::debug!(request_id, message = %message, "skip unrelated SSE message");
            continue;
        }
        if let Some(reply) = ToolReply::from_message(&message) {
            return Ok(reply);
        }
    }
    Err(McpError::NoResult { id: request_id })
}

/// `data:` 行的非空载荷
fn data_payload(line: &str) -> Option<&str> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        None
    } else {
        Some(payload)
    }
}

/// 把字节流切成行；块边界可以落在任意位置（包括多字节字符中间）
pub struct LineReader {
    body: BodyStream,
    buf: Vec<u8>,
    done: bool,
}

impl LineReader {
    pub fn new(body: BodyStream) -> Self {
        Self {
            body,
            buf: Vec::new(),
            done: false,
        }
    }

    /// 下一行（去掉 `\n` 与可选的 `\r`）；流结束且缓冲为空时返回 None
    pub async fn next_line(&mut self) -> Result<Option<String>, McpError> {
        loop {
            if let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
                let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }
            if self.done {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let rest = std::mem::take(&mut self.buf);
                let line = String::from_utf8_lossy(&rest);
                return Ok(Some(line.trim_end_matches('\r').to_string()));
            }
            match self.body.next().await {
                Some(chunk) => self.buf.extend_from_slice(&chunk?),
                None => self.done = true,
            }
        }
    }

    pub async fn read_to_end(&mut self) -> Result<Vec<u8>, McpError> {
        while let Some(chunk) = self.body.next().await {
            self.buf.extend_from_slice(&chunk?);
        }
        self.done = true;
        Ok(std::mem::take(&mut self.buf))
    }
}
