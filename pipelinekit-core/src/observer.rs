// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Observer
//!
//! The lifecycle event contract lifecycle-aware collaborators (metrics,
//! logging, tracing bridges) implement. The fan-out, isolation, and
//! filtering behavior (`ObserverRegistry`, `ConditionalObserver`,
//! `FailureOnlyObserver`) live in `pipelinekit`, which owns the concrete
//! async machinery; this crate only defines what an observer looks like and
//! what it is handed.

use async_trait::async_trait;

use crate::context::ContextMetadata;
use crate::error::PipelineError;

/// A single lifecycle occurrence an `Observer` is notified of. Carrying
/// these as one enum (rather than one trait method per event) keeps
/// `ObserverRegistry`'s fan-out loop a single iteration over a single
/// method, isolating observer failures per call without the registry
/// needing one isolated `match` arm per event kind.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// Emitted once per execution, before admission and the chain run.
    PipelineWillExecute { command_type: String, metadata: ContextMetadata, pipeline_type: String },

    /// Emitted once per execution that completes without error.
    PipelineDidExecute {
        command_type: String,
        metadata: ContextMetadata,
        pipeline_type: String,
        elapsed_ms: u64,
    },

    /// Emitted once per execution that completes with an error (including
    /// gate rejection).
    PipelineDidFail {
        command_type: String,
        error: PipelineError,
        metadata: ContextMetadata,
        pipeline_type: String,
        elapsed_ms: u64,
    },

    /// Emitted immediately before a middleware's `execute` runs.
    MiddlewareWillExecute { middleware_name: String, command_type: String, correlation_id: String },

    /// Emitted after a middleware's `execute` returns successfully
    /// (including when it short-circuits).
    MiddlewareDidExecute { middleware_name: String, command_type: String, correlation_id: String },

    /// Emitted when a middleware's `execute` returns an error.
    MiddlewareDidFail {
        middleware_name: String,
        command_type: String,
        correlation_id: String,
        error: PipelineError,
    },

    /// Emitted immediately before the terminal handler runs.
    HandlerWillExecute { command_type: String, correlation_id: String },

    /// Emitted after the terminal handler returns successfully.
    HandlerDidExecute { command_type: String, correlation_id: String },

    /// Emitted when the terminal handler returns an error.
    HandlerDidFail { command_type: String, correlation_id: String, error: PipelineError },

    /// An application-defined event emitted by middleware via
    /// `Context::emit_custom`, outside the standard lifecycle.
    Custom { name: String, correlation_id: String },
}

/// A sink for lifecycle events. Implementations MUST NOT assume they run on
/// any particular task and SHOULD return quickly; the registry awaits each
/// observer in turn, so a slow observer delays delivery to the next one
/// (but never the pipeline's own result, which has already been produced).
#[async_trait]
pub trait Observer: Send + Sync {
    /// Notified of one lifecycle event. A `Result::Err` here is isolated by
    /// the registry: it is reported to the registry's error-handler
    /// callback and does not stop delivery to other observers or affect the
    /// pipeline's outcome.
    async fn on_event(&self, event: &LifecycleEvent) -> Result<(), PipelineError>;
}

/// The non-owning handle a [`crate::context::Context`] holds to reach the
/// observer registry without the context owning (and outliving) it. The
/// concrete `ObserverRegistry` in `pipelinekit` implements this; `Context`
/// only ever sees it through a `Weak<dyn EventSink>`.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Fans a custom event out to every registered observer, tagged with
    /// the emitting execution's correlation id.
    async fn emit_custom(&self, name: &str, correlation_id: &str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingObserver {
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Observer for CountingObserver {
        async fn on_event(&self, _event: &LifecycleEvent) -> Result<(), PipelineError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn observer_receives_events_passed_to_it() {
        let seen = Arc::new(AtomicUsize::new(0));
        let observer = CountingObserver { seen: seen.clone() };
        let event = LifecycleEvent::Custom { name: "ping".into(), correlation_id: "c1".into() };
        observer.on_event(&event).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
