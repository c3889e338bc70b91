//! MCP 层：streamable HTTP 上的 JSON-RPC 工具调用客户端
//!
//! - **jsonrpc**: 请求 / 通知信封、id 分配、ToolReply
//! - **transport**: McpTransport trait 与 reqwest 实现
//! - **session**: initialize 握手与会话令牌
//! - **decode**: application/json 与 text/event-stream 两种响应解码
//! - **client**: McpClient::call_tool
//! - **mock**: 脚本化传输（测试用）

pub mod client;
pub mod decode;
pub mod error;
pub mod jsonrpc;
pub mod mock;
pub mod session;
pub mod transport;

pub use client::McpClient;
pub use decode::ResponseEncoding;
pub use error::McpError;
pub use jsonrpc::{ClientInfo, ToolReply};
pub use mock::{ScriptedReply, ScriptedTransport};
pub use session::{SessionManager, SessionSettings};
pub use transport::{HttpReply, HttpTransport, McpTransport, SESSION_HEADER};
