//! The concurrency gate and the pipeline executor working together: a
//! bounded pipeline actually serializes its executions and surfaces the
//! gate's errors as pipeline failures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pipelinekit::application::Pipeline;
use pipelinekit_core::{BackPressureStrategy, Command, Context, Handler, PipelineError, PipelineOptions};

#[derive(Clone)]
struct Slow(u64);
impl Command for Slow {
    type Output = u64;
}

struct SlowHandler {
    concurrent: Arc<AtomicUsize>,
    max_observed: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler<Slow> for SlowHandler {
    async fn handle(&self, command: &Slow, _context: &Context) -> Result<u64, PipelineError> {
        let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_observed.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.concurrent.fetch_sub(1, Ordering::SeqCst);
        Ok(command.0)
    }
}

#[tokio::test]
async fn max_concurrency_one_serializes_execution() {
    crate::common::init_tracing();
    let concurrent = Arc::new(AtomicUsize::new(0));
    let max_observed = Arc::new(AtomicUsize::new(0));
    let handler = SlowHandler { concurrent: concurrent.clone(), max_observed: max_observed.clone() };
    let options = PipelineOptions::bounded(1, BackPressureStrategy::Suspend);
    let pipeline = Arc::new(Pipeline::new(handler, options));

    let mut tasks = Vec::new();
    for i in 0..4u64 {
        let pipeline = pipeline.clone();
        tasks.push(tokio::spawn(async move { pipeline.execute(Slow(i), None).await.unwrap() }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(max_observed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn error_timeout_strategy_surfaces_as_a_pipeline_failure() {
    struct NeverHandler;
    #[async_trait]
    impl Handler<Slow> for NeverHandler {
        async fn handle(&self, _command: &Slow, _context: &Context) -> Result<u64, PipelineError> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    let options = PipelineOptions::bounded(1, BackPressureStrategy::Error { timeout: Duration::from_millis(20) });
    let pipeline = Arc::new(Pipeline::new(NeverHandler, options));

    let saturating = pipeline.clone();
    let _blocked = tokio::spawn(async move {
        let _ = saturating.execute(Slow(0), None).await;
    });
    tokio::task::yield_now().await;

    let result = pipeline.execute(Slow(1), None).await;
    assert!(matches!(result, Err(PipelineError::Timeout { .. })));
}
