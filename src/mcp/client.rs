//! MCP 工具调用客户端
//!
//! `McpClient` 自己持有请求 id 计数器与会话令牌，通过 `Arc` 在并行任务间共享。
//! 单次调用：确保会话 → 分配 id → POST `tools/call` → 按 Content-Type 解码 → 返回 [`ToolReply`]。
//! 协议错误只影响本次调用，会话保持可复用。

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::config::McpSection;
use crate::mcp::decode::{decode_event_stream, decode_json, ResponseEncoding};
use crate::mcp::jsonrpc::{ClientInfo, Request, RequestIds, ToolCallParams, ToolReply, METHOD_TOOLS_CALL};
use crate::mcp::session::{SessionManager, SessionSettings};
use crate::mcp::transport::{HttpTransport, McpTransport};
use crate::mcp::McpError;

pub struct McpClient {
    transport: Arc<dyn McpTransport>,
    session: SessionManager,
    ids: RequestIds,
}

impl McpClient {
    pub fn new(transport: Arc<dyn McpTransport>, settings: SessionSettings) -> Self {
        Self {
            transport,
            session: SessionManager::new(settings),
            ids: RequestIds::new(),
        }
    }

    /// 按 [mcp] 配置构建 HTTP 客户端
    pub fn from_config(cfg: &McpSection) -> Result<Self, McpError> {
        let timeout = cfg.request_timeout_secs.map(Duration::from_secs);
        let transport = HttpTransport::new(cfg.url.clone(), timeout)?;
        let settings = SessionSettings {
            protocol_version: cfg.protocol_version.clone(),
            client_info: ClientInfo {
                name: cfg.client_name.clone(),
                version: cfg.client_version.clone(),
            },
        };
        tracing::info!(url = %cfg.url, "mcp client configured");
        Ok(Self::new(Arc::new(transport), settings))
    }

    pub async fn ensure_session(&self) -> Result<Option<String>, McpError> {
        self.session
            .ensure_session(self.transport.as_ref(), &self.ids)
            .await
    }

    pub async fn session_id(&self) -> Option<String> {
        self.session.current().await
    }

    /// 调用远端工具。工具级错误作为 `ToolReply::Error` 返回，传输 / 协议错误作为 Err
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolReply, McpError> {
        let start = Instant::now();
        let args_preview = args_preview(&arguments);
        let session = self.ensure_session().await?;

        let id = self.ids.next_id();
        let result = self.send_call(id, name, arguments, session.as_deref()).await;

        let outcome = match &result {
            Ok(reply) if reply.is_error() => "error",
            Ok(_) => "result",
            Err(e) if e.is_protocol() => "protocol_error",
            Err(_) => "transport_error",
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": name,
            "id": id,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit, "tool");

        result
    }

    /// 以类型化参数调用（参数结构体序列化为 JSON 对象）
    pub async fn call_tool_with<A: Serialize>(&self, name: &str, args: &A) -> Result<ToolReply, McpError> {
        self.call_tool(name, serde_json::to_value(args)?).await
    }

    async fn send_call(
        &self,
        id: u64,
        name: &str,
        arguments: Value,
        session: Option<&str>,
    ) -> Result<ToolReply, McpError> {
        let params = ToolCallParams {
            name: name.to_string(),
            arguments,
        };
        let request = Request::new(id, METHOD_TOOLS_CALL, Some(serde_json::to_value(params)?));
        let reply = self
            .transport
            .post(&serde_json::to_value(&request)?, session)
            .await?;

        let status = reply.status;
        if !reply.is_success() {
            let body = reply.text().await.unwrap_or_default();
            return Err(McpError::Transport { status, body });
        }

        let content_type = reply.content_type().to_string();
        match ResponseEncoding::from_content_type(&content_type) {
            Some(ResponseEncoding::Json) => decode_json(reply.body, id).await,
            Some(ResponseEncoding::EventStream) => decode_event_stream(reply.body, id).await,
            None => Err(McpError::UnexpectedContentType {
                status,
                content_type,
            }),
        }
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
