//! Scout - 端到端示例
//!
//! 入口：初始化日志、加载配置，把内置的漏洞描述交给 LLM 选择工具，经 MCP 调用并打印结果。

use anyhow::Context;
use scout::agent::{ask_with_tools, example_prompt, AskOutcome};
use scout::config::load_config;
use scout::llm::create_llm_from_config;
use scout::mcp::{McpClient, ToolReply};
use scout::tools::attack_tools;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    scout::observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    let client = McpClient::from_config(&cfg.mcp).context("Failed to create MCP client")?;
    let llm = create_llm_from_config(&cfg.llm);
    let registry = attack_tools();

    let outcome = ask_with_tools(llm.as_ref(), &client, &registry, &example_prompt())
        .await
        .context("Tool call failed")?;

    let (prompt_tokens, completion_tokens, total_tokens) = llm.token_usage();
    tracing::info!(prompt_tokens, completion_tokens, total_tokens, "LLM token usage");

    match outcome {
        AskOutcome::ToolCalled {
            name,
            arguments,
            reply,
        } => {
            println!("\n🛠 Called {} with:\n{}", name, serde_json::to_string_pretty(&arguments)?);
            match reply {
                ToolReply::Result(v) => println!("→ Result:\n{}", serde_json::to_string_pretty(&v)?),
                ToolReply::Error(e) => println!("→ Tool error:\n{}", serde_json::to_string_pretty(&e)?),
            }
        }
        AskOutcome::Answered(text) => println!("\n💬 {}", text),
        AskOutcome::ServerError(body) => println!("MCP server error: {}", body),
    }

    Ok(())
}
