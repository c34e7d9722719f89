// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Observer Registry
//!
//! Fans a [`LifecycleEvent`] out to an immutable list of observers,
//! isolating each observer's failure from the others and from the
//! pipeline's own outcome: an observer that errors is reported to the
//! registry's error-handler callback, not to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use pipelinekit_core::observer::{EventSink, LifecycleEvent, Observer};
use pipelinekit_core::PipelineError;

/// Callback invoked with an observer's error and the event it failed on,
/// so failures are diagnosable without aborting the fan-out.
pub type ObserverErrorHandler = Arc<dyn Fn(&PipelineError, &LifecycleEvent) + Send + Sync>;

/// The concrete fan-out: an immutable observer list plus an error-handler
/// callback. Constructed once per pipeline and shared across executions.
pub struct ObserverRegistry {
    observers: Vec<Arc<dyn Observer>>,
    on_observer_error: ObserverErrorHandler,
}

impl ObserverRegistry {
    /// Builds a registry from a fixed observer list. `on_observer_error` is
    /// called once per failing observer per event, never aborting delivery
    /// to the rest of the list.
    pub fn new(observers: Vec<Arc<dyn Observer>>, on_observer_error: ObserverErrorHandler) -> Self {
        Self { observers, on_observer_error }
    }

    /// A registry that logs observer failures via `tracing::warn!` instead
    /// of requiring a caller-supplied callback.
    pub fn with_logging_error_handler(observers: Vec<Arc<dyn Observer>>) -> Self {
        Self::new(
            observers,
            Arc::new(|error, event| {
                tracing::warn!(error = %error, event = ?event, "observer failed, continuing fan-out");
            }),
        )
    }

    /// Notifies every observer of `event` in list order, isolating each
    /// one's failure: a failing observer neither stops delivery to the
    /// rest nor propagates to the pipeline.
    pub async fn notify(&self, event: LifecycleEvent) {
        for observer in &self.observers {
            if let Err(error) = observer.on_event(&event).await {
                (self.on_observer_error)(&error, &event);
            }
        }
    }
}

#[async_trait]
impl EventSink for ObserverRegistry {
    async fn emit_custom(&self, name: &str, correlation_id: &str) {
        self.notify(LifecycleEvent::Custom { name: name.to_string(), correlation_id: correlation_id.to_string() })
            .await;
    }
}

/// Forwards events to an inner observer only when `predicate(command_type,
/// correlation_id)` holds.
pub struct ConditionalObserver<F> {
    inner: Arc<dyn Observer>,
    predicate: F,
}

impl<F> ConditionalObserver<F>
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    pub fn new(inner: Arc<dyn Observer>, predicate: F) -> Self {
        Self { inner, predicate }
    }
}

#[async_trait]
impl<F> Observer for ConditionalObserver<F>
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    async fn on_event(&self, event: &LifecycleEvent) -> Result<(), PipelineError> {
        let (command_type, correlation_id) = event_identity(event);
        if (self.predicate)(command_type, correlation_id) {
            self.inner.on_event(event).await
        } else {
            Ok(())
        }
    }
}

/// Forwards only `*DidFail` events to an inner observer.
pub struct FailureOnlyObserver {
    inner: Arc<dyn Observer>,
}

impl FailureOnlyObserver {
    pub fn new(inner: Arc<dyn Observer>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Observer for FailureOnlyObserver {
    async fn on_event(&self, event: &LifecycleEvent) -> Result<(), PipelineError> {
        let is_failure = matches!(
            event,
            LifecycleEvent::PipelineDidFail { .. }
                | LifecycleEvent::MiddlewareDidFail { .. }
                | LifecycleEvent::HandlerDidFail { .. }
        );
        if is_failure {
            self.inner.on_event(event).await
        } else {
            Ok(())
        }
    }
}

fn event_identity(event: &LifecycleEvent) -> (&str, &str) {
    match event {
        LifecycleEvent::PipelineWillExecute { command_type, metadata, .. } => {
            (command_type.as_str(), metadata.correlation_id.as_str())
        }
        LifecycleEvent::PipelineDidExecute { command_type, metadata, .. } => {
            (command_type.as_str(), metadata.correlation_id.as_str())
        }
        LifecycleEvent::PipelineDidFail { command_type, metadata, .. } => {
            (command_type.as_str(), metadata.correlation_id.as_str())
        }
        LifecycleEvent::MiddlewareWillExecute { command_type, correlation_id, .. }
        | LifecycleEvent::MiddlewareDidExecute { command_type, correlation_id, .. }
        | LifecycleEvent::MiddlewareDidFail { command_type, correlation_id, .. } => {
            (command_type.as_str(), correlation_id.as_str())
        }
        LifecycleEvent::HandlerWillExecute { command_type, correlation_id }
        | LifecycleEvent::HandlerDidExecute { command_type, correlation_id }
        | LifecycleEvent::HandlerDidFail { command_type, correlation_id, .. } => {
            (command_type.as_str(), correlation_id.as_str())
        }
        LifecycleEvent::Custom { correlation_id, .. } => ("", correlation_id.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pipelinekit_core::context::ContextMetadata;

    struct RecordingObserver {
        seen: Arc<Mutex<Vec<&'static str>>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl Observer for RecordingObserver {
        async fn on_event(&self, event: &LifecycleEvent) -> Result<(), PipelineError> {
            let label = match event {
                LifecycleEvent::PipelineDidExecute { .. } => "did_execute",
                LifecycleEvent::PipelineDidFail { .. } => "did_fail",
                _ => "other",
            };
            self.seen.lock().push(label);
            if self.fail_on == Some(label) {
                Err(PipelineError::internal_error("observer exploded"))
            } else {
                Ok(())
            }
        }
    }

    fn sample_event() -> LifecycleEvent {
        LifecycleEvent::PipelineDidExecute {
            command_type: "Echo".into(),
            metadata: ContextMetadata::new(),
            pipeline_type: "Pipeline<Echo>".into(),
            elapsed_ms: 1,
        }
    }

    #[tokio::test]
    async fn every_observer_receives_the_event_even_if_one_fails() {
        let seen1 = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(0usize));
        let errors_clone = errors.clone();

        let observers: Vec<Arc<dyn Observer>> = vec![
            Arc::new(RecordingObserver { seen: seen1.clone(), fail_on: Some("did_execute") }),
            Arc::new(RecordingObserver { seen: seen2.clone(), fail_on: None }),
        ];
        let registry = ObserverRegistry::new(
            observers,
            Arc::new(move |_err, _event| {
                *errors_clone.lock() += 1;
            }),
        );

        registry.notify(sample_event()).await;

        assert_eq!(*seen1.lock(), vec!["did_execute"]);
        assert_eq!(*seen2.lock(), vec!["did_execute"]);
        assert_eq!(*errors.lock(), 1);
    }

    #[tokio::test]
    async fn failure_only_observer_ignores_non_failure_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner: Arc<dyn Observer> = Arc::new(RecordingObserver { seen: seen.clone(), fail_on: None });
        let wrapped = FailureOnlyObserver::new(inner);

        wrapped.on_event(&sample_event()).await.unwrap();
        assert!(seen.lock().is_empty());
    }
}
