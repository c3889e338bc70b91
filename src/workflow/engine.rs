//! 流水线引擎
//!
//! 规划 → fan-out → 合并。fan-out 每个工作单元一个 tokio 任务（JoinSet），
//! 片段经 mpsc 通道汇总，所有任务结束后再合并；单元失败按 [`FailurePolicy`] 处理。

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::mcp::McpClient;
use crate::tools::TacticQuery;
use crate::workflow::planner::Planner;
use crate::workflow::types::*;

/// 单元执行器 trait：对一个工作单元取回结果集合
#[async_trait]
pub trait UnitExecutor: Send + Sync {
    async fn execute(&self, unit: &WorkUnit) -> Result<Value, WorkflowError>;
}

/// 通过 MCP 按战术查询技术
pub struct McpUnitExecutor {
    client: Arc<McpClient>,
    tool: String,
    include_description: bool,
}

impl McpUnitExecutor {
    pub fn new(client: Arc<McpClient>, tool: impl Into<String>, include_description: bool) -> Self {
        Self {
            client,
            tool: tool.into(),
            include_description,
        }
    }
}

#[async_trait]
impl UnitExecutor for McpUnitExecutor {
    async fn execute(&self, unit: &WorkUnit) -> Result<Value, WorkflowError> {
        let query = TacticQuery {
            tactic: unit.clone(),
            include_description: self.include_description,
        };
        let reply = self
            .client
            .call_tool_with(&self.tool, &query)
            .await
            .map_err(|source| WorkflowError::Unit {
                unit: unit.clone(),
                source,
            })?;
        reply.into_result().map_err(|error| WorkflowError::ToolError {
            unit: unit.clone(),
            error,
        })
    }
}

/// 三阶段流水线
pub struct Pipeline {
    pub(crate) planner: Arc<dyn Planner>,
    pub(crate) executor: Arc<dyn UnitExecutor>,
    pub(crate) per_unit_limit: usize,
    pub(crate) separator: String,
    pub(crate) policy: FailurePolicy,
}

impl Pipeline {
    pub async fn run(&self) -> Result<PipelineReport, WorkflowError> {
        let units = self.planner.plan().await?;
        tracing::info!(stage = ?Stage::Plan, units = units.len(), "plan ready");

        let (fragments, failures) = self.fan_out(&units).await?;
        tracing::info!(
            stage = ?Stage::FanOut,
            fragments = fragments.len(),
            failures = failures.len(),
            "fan-out finished"
        );

        let report = merge(&fragments, &self.separator);
        tracing::info!(stage = ?Stage::Merge, chars = report.len(), "report merged");

        Ok(PipelineReport {
            units,
            fragments,
            failures,
            report,
        })
    }

    /// 每个单元独立调度；每个单元至多向累加器追加一次
    pub async fn fan_out(
        &self,
        units: &[WorkUnit],
    ) -> Result<(Vec<String>, Vec<(WorkUnit, String)>), WorkflowError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let mut tasks = JoinSet::new();

        for unit in units {
            let unit = unit.clone();
            let executor = Arc::clone(&self.executor);
            let tx = tx.clone();
            let limit = self.per_unit_limit;
            tasks.spawn(async move {
                let work = run_unit(executor.as_ref(), &unit, limit, &tx);
                // panic 也要带上单元名
                let result = AssertUnwindSafe(work)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| Err(WorkflowError::Panicked { unit: unit.clone() }));
                (unit, result)
            });
        }
        drop(tx);

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (unit, err) = match joined {
                Ok((_, Ok(()))) => continue,
                Ok((unit, Err(e))) => (unit, e),
                Err(e) if e.is_cancelled() => continue,
                Err(e) => ("?".to_string(), WorkflowError::Join(e.to_string())),
            };
            match self.policy {
                FailurePolicy::AbortAll => {
                    tracing::error!(unit = %unit, error = %err, "work unit failed, aborting pipeline");
                    tasks.abort_all();
                    return Err(err);
                }
                FailurePolicy::BestEffort => {
                    tracing::warn!(unit = %unit, error = %err, "work unit failed, continuing");
                    failures.push((unit, err.to_string()));
                }
            }
        }

        let mut fragments = Vec::new();
        while let Some(fragment) = rx.recv().await {
            fragments.push(fragment);
        }
        Ok((fragments, failures))
    }
}

async fn run_unit(
    executor: &dyn UnitExecutor,
    unit: &WorkUnit,
    limit: usize,
    tx: &mpsc::UnboundedSender<String>,
) -> Result<(), WorkflowError> {
    let value = executor.execute(unit).await?;
    let entries = result_entries(&value);
    tracing::debug!(unit = %unit, entries = entries.len(), "unit finished");
    if let Some(fragment) = render_fragment(&entries, limit) {
        let _ = tx.send(fragment);
    }
    Ok(())
}

/// 合并：用分隔符连接；没有片段时为空串
pub fn merge(fragments: &[String], separator: &str) -> String {
    fragments.join(separator)
}

/// 从工具结果中取出条目集合
///
/// 数组直接使用；对象依次尝试 `structuredContent.result`、`content` 数组；其他值视为单条目
pub fn result_entries(value: &Value) -> Vec<Value> {
    if let Value::Array(items) = value {
        return items.clone();
    }
    if let Some(items) = value
        .pointer("/structuredContent/result")
        .and_then(Value::as_array)
    {
        return items.clone();
    }
    if let Some(items) = value.get("content").and_then(Value::as_array) {
        return items.clone();
    }
    if value.is_null() {
        return Vec::new();
    }
    vec![value.clone()]
}

/// 取前 `limit` 个条目渲染为一个片段；无条目时不产生片段
pub fn render_fragment(entries: &[Value], limit: usize) -> Option<String> {
    let lines: Vec<String> = entries.iter().take(limit).map(render_entry).collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn render_entry(entry: &Value) -> String {
    match entry {
        Value::String(s) => s.clone(),
        _ => match entry.get("text").and_then(Value::as_str) {
            Some(text) => text.to_string(),
            None => entry.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{EmptyPlanner, FixedPlanner, PipelineBuilder};
    use serde_json::json;

    struct ListExecutor;

    #[async_trait]
    impl UnitExecutor for ListExecutor {
        async fn execute(&self, unit: &WorkUnit) -> Result<Value, WorkflowError> {
            let items: Vec<String> = (1..=8).map(|i| format!("{}-{}", unit, i)).collect();
            Ok(json!(items))
        }
    }

    #[test]
    fn test_merge_empty_has_no_separator() {
        assert_eq!(merge(&[], DEFAULT_SEPARATOR), "");
        assert_eq!(merge(&["a".to_string()], DEFAULT_SEPARATOR), "a");
        assert_eq!(
            merge(&["a".to_string(), "b".to_string()], DEFAULT_SEPARATOR),
            "a\n\n---\n\nb"
        );
    }

    #[test]
    fn test_result_entries_shapes() {
        assert_eq!(result_entries(&json!([1, 2])).len(), 2);
        assert_eq!(
            result_entries(&json!({"structuredContent": {"result": [1, 2, 3]}, "content": [1]})).len(),
            3
        );
        assert_eq!(
            result_entries(&json!({"content": [{"type": "text", "text": "a"}]})),
            vec![json!({"type": "text", "text": "a"})]
        );
        assert_eq!(result_entries(&json!({"name": "x"})).len(), 1);
        assert!(result_entries(&Value::Null).is_empty());
    }

    #[test]
    fn test_render_fragment_limits_entries() {
        let entries: Vec<Value> = (0..10).map(|i| json!({"type": "text", "text": format!("T{}", i)})).collect();
        let fragment = render_fragment(&entries, 5).unwrap();
        assert_eq!(fragment, "T0\nT1\nT2\nT3\nT4");
        assert_eq!(render_fragment(&[], 5), None);
        assert_eq!(render_fragment(&[json!({"id": 1})], 5).unwrap(), "{\"id\":1}");
    }

    #[tokio::test]
    async fn test_run_with_empty_plan() {
        let pipeline = PipelineBuilder::new()
            .planner(Arc::new(EmptyPlanner))
            .executor(Arc::new(ListExecutor))
            .build()
            .unwrap();
        let report = pipeline.run().await.unwrap();
        assert!(report.units.is_empty());
        assert!(report.fragments.is_empty());
        assert_eq!(report.report, "");
    }

    #[tokio::test]
    async fn test_each_unit_contributes_one_limited_fragment() {
        let pipeline = PipelineBuilder::new()
            .planner(Arc::new(FixedPlanner::new(vec!["a".into(), "b".into()])))
            .executor(Arc::new(ListExecutor))
            .build()
            .unwrap();
        let report = pipeline.run().await.unwrap();

        let mut fragments = report.fragments.clone();
        fragments.sort();
        assert_eq!(fragments, vec!["a-1\na-2\na-3\na-4\na-5", "b-1\nb-2\nb-3\nb-4\nb-5"]);
        assert_eq!(report.report.matches(DEFAULT_SEPARATOR).count(), 1);
    }
}
