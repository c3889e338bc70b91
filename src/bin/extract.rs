//! Scout 数据抽取
//!
//! 从 ATT&CK STIX bundle 中筛出指定类型的对象，写出 name / description / mitre-id。
//!
//! 用法: scout-extract [INPUT] [OUTPUT]
//! 未给出时使用 [extract] 配置（默认 data/enterprise-attack.json → results.json）。

use std::path::PathBuf;

use anyhow::Context;
use scout::config::load_config;
use scout::extract::run_extract;

fn main() -> anyhow::Result<()> {
    scout::observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    let mut args = std::env::args().skip(1);
    let input = args.next().map(PathBuf::from).unwrap_or(cfg.extract.input);
    let output = args.next().map(PathBuf::from).unwrap_or(cfg.extract.output);

    let summary = run_extract(&input, &output, &cfg.extract.object_type)
        .with_context(|| format!("Extract {} failed", input.display()))?;

    println!(
        "{} of {} objects written to {}",
        summary.kept,
        summary.total,
        output.display()
    );
    Ok(())
}
