//! 规划阶段：产出有序的工作单元列表

use async_trait::async_trait;

use crate::workflow::types::{WorkUnit, WorkflowError};

#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self) -> Result<Vec<WorkUnit>, WorkflowError>;
}

/// 占位规划器：不产生任何工作单元
#[derive(Debug, Default)]
pub struct EmptyPlanner;

#[async_trait]
impl Planner for EmptyPlanner {
    async fn plan(&self) -> Result<Vec<WorkUnit>, WorkflowError> {
        Ok(Vec::new())
    }
}

/// 固定列表规划器（来自配置 [graph].tactics）
#[derive(Debug, Clone)]
pub struct FixedPlanner {
    units: Vec<WorkUnit>,
}

impl FixedPlanner {
    pub fn new(units: Vec<WorkUnit>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl Planner for FixedPlanner {
    async fn plan(&self) -> Result<Vec<WorkUnit>, WorkflowError> {
        Ok(self.units.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_planner() {
        assert!(EmptyPlanner.plan().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fixed_planner_keeps_order() {
        let planner = FixedPlanner::new(vec!["persistence".into(), "execution".into()]);
        assert_eq!(planner.plan().await.unwrap(), vec!["persistence", "execution"]);
    }
}
