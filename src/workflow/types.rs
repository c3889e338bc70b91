//! 流水线类型定义
//!
//! 工作单元、失败策略、运行报告与错误类型

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::mcp::McpError;

/// 一个工作单元（此处为 ATT&CK 战术名）
pub type WorkUnit = String;

/// 合并阶段默认分隔符
pub const DEFAULT_SEPARATOR: &str = "\n\n---\n\n";

/// 单个 fan-out 任务失败时整条流水线的行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 第一个失败即中止其余任务，流水线返回该错误
    #[default]
    AbortAll,
    /// 记录失败并继续，失败单元不贡献片段
    BestEffort,
}

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Plan,
    FanOut,
    Merge,
}

/// 一次运行的结果
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// 规划阶段产出的工作单元
    pub units: Vec<WorkUnit>,
    /// 各单元贡献的片段（顺序不保证）
    pub fragments: Vec<String>,
    /// BestEffort 下失败的单元与原因
    pub failures: Vec<(WorkUnit, String)>,
    /// 合并后的最终文本
    pub report: String,
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Work unit '{unit}' failed: {source}")]
    Unit {
        unit: WorkUnit,
        #[source]
        source: McpError,
    },

    #[error("Work unit '{unit}' returned tool error: {error}")]
    ToolError { unit: WorkUnit, error: Value },

    #[error("Work unit '{unit}' panicked")]
    Panicked { unit: WorkUnit },

    #[error("Task join error: {0}")]
    Join(String),

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfiguration(String),
}

impl WorkflowError {
    /// 出错的工作单元（若有）
    pub fn unit(&self) -> Option<&str> {
        match self {
            WorkflowError::Unit { unit, .. }
            | WorkflowError::ToolError { unit, .. }
            | WorkflowError::Panicked { unit } => Some(unit),
            _ => None,
        }
    }
}
