//! Pipeline Runner: executes stages in order and records a report
use crate::context::ExecutionContext;
use crate::data_model::{RunReport, StageReport};
use crate::error::Result;
use crate::stage::{Stage, StageOutcome};
use std::time::Instant;

pub struct PipelineRunner {
    stages: Vec<Box<dyn Stage>>,
    pipeline_id: String,
}

/// Report plus the raw outcome of every stage, in execution order.
#[derive(Debug)]
pub struct PipelineRun {
    pub report: RunReport,
    pub outcomes: Vec<(&'static str, StageOutcome)>,
}

impl PipelineRun {
    pub fn outcome(&self, id: &str) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|(s, _)| *s == id).map(|(_, o)| o)
    }
}

impl PipelineRunner {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        let pipeline_id = stages.iter().map(|s| s.id()).collect::<Vec<_>>().join("→");

        Self { stages, pipeline_id }
    }

    /// Runs every stage, stopping at the first error.
    pub async fn run(&self, ctx: &ExecutionContext) -> Result<PipelineRun> {
        ctx.config.validate()?;
        let started_at = chrono::Utc::now();
        let mut reports = Vec::new();
        let mut outcomes = Vec::new();

        tracing::info!(run_id = %ctx.run_id, pipeline = %self.pipeline_id, "pipeline started");

        for stage in &self.stages {
            let start = Instant::now();
            tracing::info!(stage = stage.id(), "stage started");

            let outcome = stage.run(ctx).await.map_err(|e| {
                tracing::error!(stage = stage.id(), "stage failed: {}", e);
                e
            })?;

            let latency_ms = start.elapsed().as_millis() as u64;
            let process = outcome.process.as_ref();
            if let Some(p) = process {
                tracing::debug!(stage = stage.id(), "engine output:\n{}", p.output_text());
            }
            tracing::info!(
                stage = stage.id(),
                latency_ms,
                summary = outcome.summary.as_deref().unwrap_or(""),
                "stage finished"
            );

            reports.push(StageReport {
                id: stage.id().to_string(),
                exit_code: process.and_then(|p| p.code),
                success: process.map_or(true, |p| p.success),
                latency_ms,
                output_hash: process.map(|p| self.hash_bytes(&p.output)),
                summary: outcome.summary.clone(),
            });
            outcomes.push((stage.id(), outcome));
        }

        let report = RunReport {
            run_id: ctx.run_id.clone(),
            pipeline_id: self.pipeline_id.clone(),
            started_at,
            finished_at: chrono::Utc::now(),
            stages: reports,
        };
        Ok(PipelineRun { report, outcomes })
    }

    fn hash_bytes(&self, data: &[u8]) -> String {
        format!("blake3:{}", blake3::hash(data))
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn stage_ids(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.id()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunConfig;
    use crate::data_model::{ProcessResult, ToolchainLocation};
    use crate::error::PipelineError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed(&'static str, Option<i32>);

    #[async_trait]
    impl Stage for Fixed {
        fn id(&self) -> &'static str {
            self.0
        }

        async fn run(&self, _ctx: &ExecutionContext) -> Result<StageOutcome> {
            Ok(match self.1 {
                Some(code) => StageOutcome::from_process(ProcessResult {
                    output: format!("{} done", self.0).into_bytes(),
                    code: Some(code),
                    success: code == 0,
                    ..Default::default()
                }),
                None => StageOutcome::summary("no engine call"),
            })
        }
    }

    struct Failing;

    #[async_trait]
    impl Stage for Failing {
        fn id(&self) -> &'static str {
            "broken"
        }

        async fn run(&self, _ctx: &ExecutionContext) -> Result<StageOutcome> {
            Err(PipelineError::Configuration("boom".to_string()))
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Stage for Counting {
        fn id(&self) -> &'static str {
            "after"
        }

        async fn run(&self, _ctx: &ExecutionContext) -> Result<StageOutcome> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(StageOutcome::default())
        }
    }

    fn ctx() -> ExecutionContext {
        let toolchain = ToolchainLocation {
            home: "/opt/pql".into(),
            pql_jar: "/opt/pql/PQL-0.2.jar".into(),
            jline_jar: "/opt/pql/jline.jar".into(),
            runtime: "/usr/bin/java".into(),
            base_classpath: vec![],
        };
        ExecutionContext::new(toolchain, RunConfig::new("/tmp"))
    }

    #[tokio::test]
    async fn test_runs_stages_in_order() {
        let runner = PipelineRunner::new(vec![
            Box::new(Fixed("prepare", None)),
            Box::new(Fixed("count", Some(1))),
            Box::new(Fixed("solve", Some(0))),
        ]);
        assert_eq!(runner.pipeline_id(), "prepare→count→solve");

        let run = runner.run(&ctx()).await.unwrap();
        let ids: Vec<_> = run.report.stages.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["prepare", "count", "solve"]);

        let count = run.report.stage("count").unwrap();
        assert_eq!(count.exit_code, Some(1));
        assert!(!count.success);
        assert!(count.output_hash.as_deref().unwrap().starts_with("blake3:"));

        let prepare = run.report.stage("prepare").unwrap();
        assert!(prepare.output_hash.is_none());
        assert_eq!(prepare.summary.as_deref(), Some("no engine call"));

        let solve = run.outcome("solve").unwrap();
        assert_eq!(solve.process.as_ref().unwrap().output_text(), "solve done");
    }

    #[tokio::test]
    async fn test_error_stops_remaining_stages() {
        let counter = Arc::new(AtomicUsize::new(0));
        let runner = PipelineRunner::new(vec![
            Box::new(Failing),
            Box::new(Counting(counter.clone())),
        ]);

        assert!(runner.run(&ctx()).await.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_work_dir_over_root_runs_nothing() {
        let root = tempfile::tempdir().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let runner = PipelineRunner::new(vec![Box::new(Counting(counter.clone()))]);

        let mut ctx = ctx();
        ctx.config = RunConfig::new(root.path()).with_work_dir(".");
        let err = runner.run(&ctx).await.unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
