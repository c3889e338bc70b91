//! 工具调用 Agent
//!
//! ask_with_tools：把用户输入与宣告的工具交给 LLM；LLM 选择了工具就经 MCP 调用，
//! 否则直接返回文本。服务端的传输错误不向上抛出，作为 `ServerError` 交给调用方展示。

use serde_json::Value;

use crate::llm::{LlmReply, ToolCallingLlm};
use crate::mcp::{McpClient, McpError, ToolReply};
use crate::tools::ToolRegistry;

/// 一次 ask 的结果
#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    ToolCalled {
        name: String,
        arguments: Value,
        reply: ToolReply,
    },
    /// LLM 未调用工具
    Answered(String),
    /// MCP 服务端返回非成功状态
    ServerError(String),
}

pub async fn ask_with_tools(
    llm: &dyn ToolCallingLlm,
    client: &McpClient,
    registry: &ToolRegistry,
    prompt: &str,
) -> anyhow::Result<AskOutcome> {
    let reply = llm.complete_with_tools(prompt, registry.tools()).await?;

    let (name, arguments) = match reply {
        LlmReply::Text(text) => return Ok(AskOutcome::Answered(text)),
        LlmReply::ToolCall { name, arguments } => (name, arguments),
    };
    if registry.get(&name).is_none() {
        tracing::warn!(tool = %name, "LLM chose a tool that was not advertised");
    }

    match client.call_tool(&name, arguments.clone()).await {
        Ok(reply) => Ok(AskOutcome::ToolCalled {
            name,
            arguments,
            reply,
        }),
        Err(McpError::Transport { status, body }) => {
            tracing::error!(status, "MCP server error");
            Ok(AskOutcome::ServerError(body))
        }
        Err(e) => Err(e.into()),
    }
}

/// 端到端示例：弱随机数生成的 SSH 主机密钥
pub fn example_prompt() -> String {
    let vulnerability_description = "
    The remote SSH host key has been generated on a Debian or Ubuntu system which contains a bug in the random number generator of its OpenSSL library.
    The problem is due to a Debian packager removing nearly all sources of entropy in the remote version of OpenSSL. An attacker can easily obtain the private part of the remote key and use this to decipher the remote session or set up a man-in-the-middle attack.
    ";

    format!(
        "Here is the description of a vulnerability: {}
    1. Identify any MITRE ATT&CK techniques, malware, or tools related to this vulnerability (include descriptions).
    2. Also retrieve a list of all techniques in the framework so we can compare them against known weaknesses.",
        vulnerability_description
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::mcp::{ScriptedReply, ScriptedTransport, SessionSettings};
    use crate::tools::attack_tools;
    use serde_json::json;
    use std::sync::Arc;

    fn client(transport: ScriptedTransport) -> McpClient {
        McpClient::new(Arc::new(transport), SessionSettings::default())
    }

    #[tokio::test]
    async fn test_tool_call_is_proxied() {
        let client = client(ScriptedTransport::new().with_call(ScriptedReply::json(
            200,
            json!({"jsonrpc": "2.0", "id": 2, "result": {"content": []}}),
        )));
        let llm = MockLlmClient::with_reply(LlmReply::ToolCall {
            name: "get_all_techniques".to_string(),
            arguments: json!({"domain": "enterprise"}),
        });

        let outcome = ask_with_tools(&llm, &client, &attack_tools(), &example_prompt())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AskOutcome::ToolCalled {
                name: "get_all_techniques".to_string(),
                arguments: json!({"domain": "enterprise"}),
                reply: ToolReply::Result(json!({"content": []})),
            }
        );
    }

    #[tokio::test]
    async fn test_text_reply_skips_mcp() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = McpClient::new(transport.clone(), SessionSettings::default());
        let llm = MockLlmClient::with_reply(LlmReply::Text("nothing to look up".to_string()));

        let outcome = ask_with_tools(&llm, &client, &attack_tools(), "hi").await.unwrap();
        assert_eq!(outcome, AskOutcome::Answered("nothing to look up".to_string()));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_reported_not_raised() {
        let client = client(ScriptedTransport::new().with_call(ScriptedReply::status(500, "tool crashed")));
        let outcome = ask_with_tools(&MockLlmClient::new(), &client, &attack_tools(), "ssh keys")
            .await
            .unwrap();
        assert_eq!(outcome, AskOutcome::ServerError("tool crashed".to_string()));
    }

    #[tokio::test]
    async fn test_protocol_error_propagates() {
        let client = client(ScriptedTransport::new().with_call(ScriptedReply::raw(200, "text/html", "<html/>")));
        let err = ask_with_tools(&MockLlmClient::new(), &client, &attack_tools(), "ssh keys")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("text/html"));
    }

    #[test]
    fn test_example_prompt_mentions_openssl() {
        let prompt = example_prompt();
        assert!(prompt.contains("OpenSSL"));
        assert!(prompt.contains("all techniques"));
    }
}
