//! 流水线构建器
//!
//! 提供流畅的API来构建流水线

use std::sync::Arc;

use crate::config::GraphSection;
use crate::mcp::McpClient;
use crate::workflow::engine::{McpUnitExecutor, Pipeline, UnitExecutor};
use crate::workflow::planner::{EmptyPlanner, FixedPlanner, Planner};
use crate::workflow::types::*;

/// 流水线构建器
pub struct PipelineBuilder {
    planner: Arc<dyn Planner>,
    executor: Option<Arc<dyn UnitExecutor>>,
    per_unit_limit: usize,
    separator: String,
    policy: FailurePolicy,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// 创建新的构建器（默认空规划器、每单元 5 条、AbortAll）
    pub fn new() -> Self {
        Self {
            planner: Arc::new(EmptyPlanner),
            executor: None,
            per_unit_limit: 5,
            separator: DEFAULT_SEPARATOR.to_string(),
            policy: FailurePolicy::default(),
        }
    }

    /// 按 [graph] 配置构建：tactics 非空时用固定规划器，worker 走 MCP
    pub fn from_config(cfg: &GraphSection, client: Arc<McpClient>) -> Self {
        let builder = Self::new()
            .executor(Arc::new(McpUnitExecutor::new(
                client,
                cfg.tool.clone(),
                cfg.include_description,
            )))
            .per_unit_limit(cfg.per_unit_limit)
            .separator(cfg.separator.clone())
            .failure_policy(cfg.failure_policy);
        if cfg.tactics.is_empty() {
            builder
        } else {
            builder.planner(Arc::new(FixedPlanner::new(cfg.tactics.clone())))
        }
    }

    pub fn planner(mut self, planner: Arc<dyn Planner>) -> Self {
        self.planner = planner;
        self
    }

    pub fn executor(mut self, executor: Arc<dyn UnitExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// 每个单元最多贡献的条目数
    pub fn per_unit_limit(mut self, limit: usize) -> Self {
        self.per_unit_limit = limit;
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 构建流水线
    pub fn build(self) -> Result<Pipeline, WorkflowError> {
        let executor = self
            .executor
            .ok_or_else(|| WorkflowError::InvalidConfiguration("executor is required".to_string()))?;
        if self.per_unit_limit == 0 {
            return Err(WorkflowError::InvalidConfiguration(
                "per_unit_limit must be at least 1".to_string(),
            ));
        }

        Ok(Pipeline {
            planner: self.planner,
            executor,
            per_unit_limit: self.per_unit_limit,
            separator: self.separator,
            policy: self.policy,
        })
    }
}
