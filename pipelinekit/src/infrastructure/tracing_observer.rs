// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Tracing Observer
//!
//! Bridges lifecycle events to `tracing` with explicit `tracing::debug!`/
//! `warn!` calls per event variant rather than a blanket `#[instrument]`
//! macro, since the fields worth logging differ per event.

use async_trait::async_trait;
use pipelinekit_core::observer::{LifecycleEvent, Observer};
use pipelinekit_core::PipelineError;

/// An [`Observer`] that logs every lifecycle event through `tracing` at a
/// severity appropriate to the event (failures at `warn`, everything else
/// at `debug`). Never fails: logging is best-effort and must not perturb
/// the pipeline it is observing.
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Observer for TracingObserver {
    async fn on_event(&self, event: &LifecycleEvent) -> Result<(), PipelineError> {
        match event {
            LifecycleEvent::PipelineWillExecute { command_type, metadata, pipeline_type } => {
                tracing::debug!(
                    command_type, pipeline_type, correlation_id = %metadata.correlation_id,
                    "pipeline will execute"
                );
            }
            LifecycleEvent::PipelineDidExecute { command_type, metadata, pipeline_type, elapsed_ms } => {
                tracing::debug!(
                    command_type, pipeline_type, correlation_id = %metadata.correlation_id, elapsed_ms,
                    "pipeline did execute"
                );
            }
            LifecycleEvent::PipelineDidFail { command_type, metadata, pipeline_type, error, elapsed_ms } => {
                tracing::warn!(
                    command_type, pipeline_type, correlation_id = %metadata.correlation_id, elapsed_ms,
                    error = %error, "pipeline did fail"
                );
            }
            LifecycleEvent::MiddlewareWillExecute { middleware_name, command_type, correlation_id } => {
                tracing::debug!(middleware_name, command_type, correlation_id, "middleware will execute");
            }
            LifecycleEvent::MiddlewareDidExecute { middleware_name, command_type, correlation_id } => {
                tracing::debug!(middleware_name, command_type, correlation_id, "middleware did execute");
            }
            LifecycleEvent::MiddlewareDidFail { middleware_name, command_type, correlation_id, error } => {
                tracing::warn!(
                    middleware_name, command_type, correlation_id, error = %error,
                    "middleware did fail"
                );
            }
            LifecycleEvent::HandlerWillExecute { command_type, correlation_id } => {
                tracing::debug!(command_type, correlation_id, "handler will execute");
            }
            LifecycleEvent::HandlerDidExecute { command_type, correlation_id } => {
                tracing::debug!(command_type, correlation_id, "handler did execute");
            }
            LifecycleEvent::HandlerDidFail { command_type, correlation_id, error } => {
                tracing::warn!(command_type, correlation_id, error = %error, "handler did fail");
            }
            LifecycleEvent::Custom { name, correlation_id } => {
                tracing::debug!(name, correlation_id, "custom event");
            }
        }
        Ok(())
    }
}
