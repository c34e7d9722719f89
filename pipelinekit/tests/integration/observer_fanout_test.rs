//! Observer fan-out through a real `Pipeline`, not just the registry in
//! isolation: a failing observer must not affect the pipeline's outcome,
//! and a healthy observer beside it must still see every event.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pipelinekit::application::Pipeline;
use pipelinekit_core::observer::{LifecycleEvent, Observer};
use pipelinekit_core::{Command, Context, Handler, PipelineError, PipelineOptions};

#[derive(Clone)]
struct Ping;
impl Command for Ping {
    type Output = &'static str;
}

struct PingHandler;
#[async_trait]
impl Handler<Ping> for PingHandler {
    async fn handle(&self, _command: &Ping, _context: &Context) -> Result<&'static str, PipelineError> {
        Ok("pong")
    }
}

struct AlwaysFails;
#[async_trait]
impl Observer for AlwaysFails {
    async fn on_event(&self, _event: &LifecycleEvent) -> Result<(), PipelineError> {
        Err(PipelineError::internal_error("observer exploded on purpose"))
    }
}

struct RecordsDidExecute {
    seen: Arc<Mutex<usize>>,
}
#[async_trait]
impl Observer for RecordsDidExecute {
    async fn on_event(&self, event: &LifecycleEvent) -> Result<(), PipelineError> {
        if matches!(event, LifecycleEvent::PipelineDidExecute { .. }) {
            *self.seen.lock() += 1;
        }
        Ok(())
    }
}

#[tokio::test]
async fn a_failing_observer_does_not_affect_the_outcome_or_its_sibling() {
    let seen = Arc::new(Mutex::new(0));
    let observers: Vec<Arc<dyn Observer>> =
        vec![Arc::new(AlwaysFails), Arc::new(RecordsDidExecute { seen: seen.clone() })];
    let pipeline = Pipeline::with_observers(PingHandler, PipelineOptions::unbounded(), observers);

    let result = pipeline.execute(Ping, None).await;
    assert_eq!(result.unwrap(), "pong");
    assert_eq!(*seen.lock(), 1);
}
