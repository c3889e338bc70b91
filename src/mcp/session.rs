//! 会话管理
//!
//! 首次调用时做一次 `initialize` 握手，从响应头 `Mcp-Session-Id` 取会话令牌，
//! 再发送 `notifications/initialized`。令牌进程内复用，不刷新、不过期、不持久化。

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::mcp::jsonrpc::{
    ClientInfo, InitializeParams, Notification, Request, RequestIds, METHOD_INITIALIZE,
    METHOD_INITIALIZED,
};
use crate::mcp::transport::McpTransport;
use crate::mcp::McpError;

/// 握手参数：协议版本与客户端身份
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub protocol_version: String,
    pub client_info: ClientInfo,
}

pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            client_info: ClientInfo::default(),
        }
    }
}

/// 持有会话令牌。握手期间一直持锁，并发调用者只会触发一次握手
pub struct SessionManager {
    settings: SessionSettings,
    slot: Mutex<Option<String>>,
}

impl SessionManager {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            slot: Mutex::new(None),
        }
    }

    /// 当前令牌（未握手时为 None）
    pub async fn current(&self) -> Option<String> {
        self.slot.lock().await.clone()
    }

    /// 幂等：已有令牌直接返回；否则握手一次。
    /// 握手失败时令牌保持为空，下次调用从头重试（单次尝试，无退避）。
    pub async fn ensure_session(
        &self,
        transport: &dyn McpTransport,
        ids: &RequestIds,
    ) -> Result<Option<String>, McpError> {
        let mut slot = self.slot.lock().await;
        if slot.is_some() {
            return Ok(slot.clone());
        }

        let request = Request::new(ids.next_id(), METHOD_INITIALIZE, Some(self.initialize_params()?));
        tracing::debug!(id = request.id, "mcp initialize");
        let reply = transport.post(&serde_json::to_value(&request)?, None).await?;
        if !reply.is_success() {
            let status = reply.status;
            let body = reply.text().await.unwrap_or_default();
            tracing::warn!(status, "mcp initialize rejected");
            return Err(McpError::Transport { status, body });
        }

        let token = reply.session_id().map(str::to_string);
        match &token {
            Some(t) => tracing::info!(session = %t, "mcp session established"),
            None => tracing::warn!("mcp server returned no session id; continuing without one"),
        }
        drop(reply);

        self.notify_initialized(transport, token.as_deref()).await;

        *slot = token.clone();
        Ok(token)
    }

    fn initialize_params(&self) -> Result<Value, McpError> {
        let params = InitializeParams {
            protocol_version: self.settings.protocol_version.clone(),
            capabilities: json!({}),
            client_info: self.settings.client_info.clone(),
        };
        Ok(serde_json::to_value(params)?)
    }

    // 发完即忘：结果只记日志
    async fn notify_initialized(&self, transport: &dyn McpTransport, token: Option<&str>) {
        let notification = Notification::new(METHOD_INITIALIZED, None);
        let body = match serde_json::to_value(&notification) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "serialize initialized notification");
                return;
            }
        };
        match transport.post(&body, token).await {
            Ok(reply) if !reply.is_success() => {
                tracing::warn!(status = reply.status, "initialized notification not accepted")
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "initialized notification failed"),
        }
    }
}
