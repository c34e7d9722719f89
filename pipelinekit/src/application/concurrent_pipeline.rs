// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Concurrent Pipeline (polymorphic dispatcher)
//!
//! A registry from a command-type identity to a type-erased `Pipeline`,
//! letting callers dispatch heterogeneous commands without knowing which
//! concrete `Pipeline<C, H>` handles each one up front.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use pipelinekit_core::{Command, Context, Handler, PipelineError};

use crate::application::pipeline::Pipeline;

#[async_trait]
trait ErasedPipeline: Send + Sync {
    async fn execute_erased(&self, command: Box<dyn Any + Send>, context: Option<Context>) -> Result<Box<dyn Any + Send>, PipelineError>;

    fn command_type_name(&self) -> &'static str;
}

#[async_trait]
impl<C, H> ErasedPipeline for Pipeline<C, H>
where
    C: Command,
    H: Handler<C> + 'static,
{
    async fn execute_erased(
        &self,
        command: Box<dyn Any + Send>,
        context: Option<Context>,
    ) -> Result<Box<dyn Any + Send>, PipelineError> {
        let command = *command.downcast::<C>().map_err(|_| PipelineError::IncompatibleCommand {
            expected: std::any::type_name::<C>().to_string(),
            got: "<erased>".to_string(),
        })?;
        let output = self.execute(command, context).await?;
        Ok(Box::new(output))
    }

    fn command_type_name(&self) -> &'static str {
        std::any::type_name::<C>()
    }
}

/// Routes commands of any registered type to their typed `Pipeline`.
#[derive(Default)]
pub struct ConcurrentPipeline {
    pipelines: RwLock<HashMap<TypeId, Arc<dyn ErasedPipeline>>>,
}

impl ConcurrentPipeline {
    pub fn new() -> Self {
        Self { pipelines: RwLock::new(HashMap::new()) }
    }

    /// Registers `pipeline` as the handler for command type `C`. A second
    /// registration for the same `C` replaces the first.
    pub fn register<C, H>(&self, pipeline: Pipeline<C, H>)
    where
        C: Command,
        H: Handler<C> + 'static,
    {
        self.pipelines.write().insert(TypeId::of::<C>(), Arc::new(pipeline));
    }

    /// Dispatches `command` to its registered pipeline. Fails with
    /// `NoHandler` if no pipeline is registered for `C`; `IncompatibleCommand`
    /// can only occur if the registry's internal invariant (one `TypeId`
    /// maps to one concrete `C`) is somehow violated.
    pub async fn execute<C>(&self, command: C, context: Option<Context>) -> Result<C::Output, PipelineError>
    where
        C: Command,
    {
        let pipeline = {
            let pipelines = self.pipelines.read();
            pipelines.get(&TypeId::of::<C>()).cloned()
        }
        .ok_or_else(|| PipelineError::NoHandler { command_type: std::any::type_name::<C>().to_string() })?;

        let boxed: Box<dyn Any + Send> = Box::new(command);
        let result = pipeline.execute_erased(boxed, context).await?;
        result.downcast::<C::Output>().map(|b| *b).map_err(|_| PipelineError::IncompatibleCommand {
            expected: std::any::type_name::<C::Output>().to_string(),
            got: pipeline.command_type_name().to_string(),
        })
    }

    /// Whether a pipeline is registered for command type `C`.
    pub fn is_registered<C: Command>(&self) -> bool {
        self.pipelines.read().contains_key(&TypeId::of::<C>())
    }
}
