//! Scout 报告流水线
//!
//! 规划 → 每个战术并行调用 MCP 工具 → 合并为一份报告并打印到标准输出。
//!
//! 战术列表来自 config/default.toml 的 [graph].tactics；为空时规划阶段不产生工作单元。
//!
//! 启动: cargo run --bin scout-report

use std::sync::Arc;

use anyhow::Context;
use scout::config::load_config;
use scout::mcp::McpClient;
use scout::workflow::PipelineBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    scout::observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    let client = Arc::new(McpClient::from_config(&cfg.mcp).context("Failed to create MCP client")?);

    let pipeline = PipelineBuilder::from_config(&cfg.graph, client)
        .build()
        .context("Invalid [graph] config")?;
    let report = match pipeline.run().await {
        Ok(report) => report,
        Err(e) => {
            if let Some(unit) = e.unit() {
                tracing::error!(unit, "work unit aborted the pipeline");
            }
            return Err(e).context("Pipeline failed");
        }
    };

    for (unit, reason) in &report.failures {
        tracing::warn!(unit = %unit, reason = %reason, "unit skipped");
    }
    if report.units.is_empty() {
        tracing::info!("no work units planned; report is empty");
    }
    println!("{}", report.report);

    Ok(())
}
