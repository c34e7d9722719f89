//! The polymorphic `ConcurrentPipeline` routing two distinct command types
//! to their own typed pipelines, plus the `NoHandler` rejection path.

use async_trait::async_trait;
use pipelinekit::application::{ConcurrentPipeline, Pipeline};
use pipelinekit_core::{Command, Context, Handler, PipelineError, PipelineOptions};

#[derive(Clone)]
struct CreateUser {
    name: String,
}
impl Command for CreateUser {
    type Output = u64;
}

struct CreateUserHandler;
#[async_trait]
impl Handler<CreateUser> for CreateUserHandler {
    async fn handle(&self, command: &CreateUser, _context: &Context) -> Result<u64, PipelineError> {
        Ok(command.name.len() as u64)
    }
}

#[derive(Clone)]
struct DeleteUser {
    id: u64,
}
impl Command for DeleteUser {
    type Output = bool;
}

struct DeleteUserHandler;
#[async_trait]
impl Handler<DeleteUser> for DeleteUserHandler {
    async fn handle(&self, command: &DeleteUser, _context: &Context) -> Result<bool, PipelineError> {
        Ok(command.id > 0)
    }
}

#[derive(Clone)]
struct Unregistered;
impl Command for Unregistered {
    type Output = ();
}

#[tokio::test]
async fn dispatches_each_command_type_to_its_own_pipeline() {
    let dispatcher = ConcurrentPipeline::new();
    dispatcher.register(Pipeline::new(CreateUserHandler, PipelineOptions::unbounded()));
    dispatcher.register(Pipeline::new(DeleteUserHandler, PipelineOptions::unbounded()));

    let created = dispatcher.execute(CreateUser { name: "alice".into() }, None).await.unwrap();
    assert_eq!(created, 5);

    let deleted = dispatcher.execute(DeleteUser { id: 7 }, None).await.unwrap();
    assert!(deleted);
}

#[tokio::test]
async fn an_unregistered_command_type_fails_with_no_handler() {
    let dispatcher = ConcurrentPipeline::new();
    dispatcher.register(Pipeline::new(CreateUserHandler, PipelineOptions::unbounded()));

    let result = dispatcher.execute(Unregistered, None).await;
    assert!(matches!(result, Err(PipelineError::NoHandler { .. })));
}
