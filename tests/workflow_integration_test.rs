//! 流水线集成测试

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use scout::mcp::{McpClient, ScriptedReply, ScriptedTransport, SessionSettings};
    use scout::workflow::*;
    use serde_json::{json, Value};

    struct CountingExecutor {
        count: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl UnitExecutor for CountingExecutor {
        async fn execute(&self, unit: &WorkUnit) -> Result<Value, WorkflowError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(json!([format!("{} done", unit)]))
        }
    }

    /// "bad" 单元立即失败，其余单元慢速成功
    struct FlakyExecutor {
        finished: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl UnitExecutor for FlakyExecutor {
        async fn execute(&self, unit: &WorkUnit) -> Result<Value, WorkflowError> {
            if unit == "bad" {
                return Err(WorkflowError::ToolError {
                    unit: unit.clone(),
                    error: json!({"message": "unknown tactic"}),
                });
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(json!([unit]))
        }
    }

    /// "boom" 单元 panic
    struct PanickyExecutor;

    #[async_trait::async_trait]
    impl UnitExecutor for PanickyExecutor {
        async fn execute(&self, unit: &WorkUnit) -> Result<Value, WorkflowError> {
            if unit == "boom" {
                panic!("executor blew up");
            }
            Ok(json!([unit]))
        }
    }

    fn units(names: &[&str]) -> Arc<FixedPlanner> {
        Arc::new(FixedPlanner::new(names.iter().map(|s| s.to_string()).collect()))
    }

    #[tokio::test]
    async fn test_parallel_units_all_execute() {
        let executor = Arc::new(CountingExecutor {
            count: AtomicUsize::new(0),
        });
        let pipeline = PipelineBuilder::new()
            .planner(units(&["a", "b", "c"]))
            .executor(executor.clone())
            .build()
            .unwrap();

        let report = pipeline.run().await.unwrap();

        assert_eq!(executor.count.load(Ordering::SeqCst), 3);
        assert_eq!(report.fragments.len(), 3);
        for unit in ["a", "b", "c"] {
            assert!(report.report.contains(&format!("{} done", unit)));
        }
        assert_eq!(report.report.matches(DEFAULT_SEPARATOR).count(), 2);
    }

    #[tokio::test]
    async fn test_abort_all_returns_first_failure() {
        let executor = Arc::new(FlakyExecutor {
            finished: AtomicUsize::new(0),
        });
        let pipeline = PipelineBuilder::new()
            .planner(units(&["slow-1", "bad", "slow-2"]))
            .executor(executor.clone())
            .failure_policy(FailurePolicy::AbortAll)
            .build()
            .unwrap();

        let err = pipeline.run().await.unwrap_err();
        assert_eq!(err.unit(), Some("bad"));

        // 其余任务已被中止
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(executor.finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_best_effort_skips_failed_unit() {
        let executor = Arc::new(FlakyExecutor {
            finished: AtomicUsize::new(0),
        });
        let pipeline = PipelineBuilder::new()
            .planner(units(&["slow-1", "bad", "slow-2"]))
            .executor(executor)
            .failure_policy(FailurePolicy::BestEffort)
            .build()
            .unwrap();

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.fragments.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "bad");
        assert!(!report.report.contains("bad"));
    }

    #[tokio::test]
    async fn test_best_effort_names_panicked_unit() {
        let pipeline = PipelineBuilder::new()
            .planner(units(&["persistence", "boom"]))
            .executor(Arc::new(PanickyExecutor))
            .failure_policy(FailurePolicy::BestEffort)
            .build()
            .unwrap();

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.fragments, vec!["persistence".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "boom");
        assert!(report.failures[0].1.contains("panicked"));
    }

    #[tokio::test]
    async fn test_abort_all_reports_panicked_unit() {
        let pipeline = PipelineBuilder::new()
            .planner(units(&["boom"]))
            .executor(Arc::new(PanickyExecutor))
            .build()
            .unwrap();

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Panicked { .. }));
        assert_eq!(err.unit(), Some("boom"));
    }

    #[tokio::test]
    async fn test_mcp_workers_share_one_session() {
        let transport = Arc::new(
            ScriptedTransport::new().with_default_call(ScriptedReply::json(
                200,
                json!({"structuredContent": {"result": (1..=7).map(|i| format!("T100{}", i)).collect::<Vec<_>>()}}),
            )),
        );
        let client = Arc::new(McpClient::new(transport.clone(), SessionSettings::default()));

        let pipeline = PipelineBuilder::new()
            .planner(units(&["persistence", "execution", "discovery"]))
            .executor(Arc::new(McpUnitExecutor::new(
                client,
                "get_techniques_by_tactic",
                true,
            )))
            .build()
            .unwrap();
        let report = pipeline.run().await.unwrap();

        assert_eq!(transport.count_method("initialize"), 1);
        assert_eq!(transport.count_method("tools/call"), 3);
        for fragment in &report.fragments {
            assert_eq!(fragment, "T1001\nT1002\nT1003\nT1004\nT1005");
        }

        let mut tactics: Vec<String> = transport
            .requests()
            .iter()
            .filter(|r| r.body["method"] == "tools/call")
            .map(|r| {
                assert_eq!(r.body["params"]["arguments"]["include_description"], true);
                r.body["params"]["arguments"]["tactic"].as_str().unwrap().to_string()
            })
            .collect();
        tactics.sort();
        assert_eq!(tactics, vec!["discovery", "execution", "persistence"]);
    }
}
