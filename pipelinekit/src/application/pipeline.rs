// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Executor
//!
//! `Pipeline<C, H>` ties the concurrency gate, the observer registry, and
//! the chain compiler together around a single typed handler. One
//! `Pipeline` instance serves exactly one `Command` type; heterogeneous
//! dispatch across command types is `ConcurrentPipeline`'s job.

use std::any::type_name;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use pipelinekit_core::observer::{EventSink, LifecycleEvent, Observer};
use pipelinekit_core::{Command, Context, Handler, Middleware, Next, PipelineError, PipelineOptions};
use tracing::Instrument;

use crate::application::chain;
use crate::infrastructure::{ConcurrencyGate, ContextPool, ObserverRegistry};

/// A typed, middleware-wrapped dispatcher for a single command type.
pub struct Pipeline<C: Command, H: Handler<C>> {
    handler: Arc<H>,
    middleware: RwLock<Vec<Arc<dyn Middleware<C>>>>,
    compiled: RwLock<Option<Arc<dyn Next<C>>>>,
    gate: Option<ConcurrencyGate>,
    context_pool: Option<ContextPool>,
    observers: Arc<ObserverRegistry>,
    pipeline_type: String,
}

impl<C: Command, H: Handler<C> + 'static> Pipeline<C, H> {
    /// A pipeline with no observers beyond silent `tracing::warn!` logging
    /// of observer failures.
    pub fn new(handler: H, options: PipelineOptions) -> Self {
        Self::with_observers(handler, options, Vec::new())
    }

    /// A pipeline wired to a fixed list of observers.
    pub fn with_observers(handler: H, options: PipelineOptions, observers: Vec<Arc<dyn Observer>>) -> Self {
        // A gate is only meaningful once there is a concurrency bound to
        // saturate against; an outstanding cap with no concurrency cap has
        // nothing to queue behind.
        let gate = options
            .max_concurrency
            .map(|_| ConcurrencyGate::new(options.max_concurrency, options.max_outstanding, options.back_pressure_strategy));
        let context_pool = options.use_context_pool.then(|| ContextPool::new(16));
        Self {
            handler: Arc::new(handler),
            middleware: RwLock::new(Vec::new()),
            compiled: RwLock::new(None),
            gate,
            context_pool,
            observers: Arc::new(ObserverRegistry::with_logging_error_handler(observers)),
            pipeline_type: format!("Pipeline<{}>", type_name::<C>()),
        }
    }

    /// Appends `middleware` to the chain and invalidates the compiled cache.
    pub fn add_middleware(&self, middleware: Arc<dyn Middleware<C>>) {
        self.middleware.write().push(middleware);
        *self.compiled.write() = None;
    }

    /// Removes every middleware whose `name()` equals `name`, invalidating
    /// the compiled cache if anything was removed. `name` stands in for
    /// `remove_middleware_of(type)`: a middleware's name is its stable
    /// identity in this implementation, since `Middleware` is not required
    /// to be `Any`-downcastable.
    pub fn remove_middleware_of(&self, name: &str) {
        let mut list = self.middleware.write();
        let before = list.len();
        list.retain(|m| m.name() != name);
        if list.len() != before {
            *self.compiled.write() = None;
        }
    }

    /// Removes all middleware and invalidates the compiled cache.
    pub fn clear(&self) {
        self.middleware.write().clear();
        *self.compiled.write() = None;
    }

    /// The current middleware count, mostly useful for tests.
    pub fn middleware_count(&self) -> usize {
        self.middleware.read().len()
    }

    fn compiled_chain(&self) -> Arc<dyn Next<C>> {
        if let Some(chain) = self.compiled.read().as_ref() {
            return chain.clone();
        }
        let mut compiled = self.compiled.write();
        if let Some(chain) = compiled.as_ref() {
            return chain.clone();
        }
        let fresh = chain::compile(&self.middleware.read(), self.handler.clone(), self.observers.clone());
        *compiled = Some(fresh.clone());
        fresh
    }

    /// Runs `command` through the gate and the compiled chain, creating a
    /// fresh (or pooled) [`Context`] if `context` is `None`.
    pub async fn execute(&self, command: C, context: Option<Context>) -> Result<C::Output, PipelineError> {
        let (context, from_pool) = match context {
            Some(ctx) => (ctx, false),
            None => match &self.context_pool {
                Some(pool) => (pool.checkout(), true),
                None => (Context::new(), false),
            },
        };

        let token = match &self.gate {
            Some(gate) => match gate.acquire().await {
                Ok(token) => Some(token),
                Err(error) => {
                    self.emit_failure(&context, &error, 0).await;
                    if from_pool {
                        if let Some(pool) = &self.context_pool {
                            pool.checkin(context);
                        }
                    }
                    return Err(error);
                }
            },
            None => None,
        };

        let command_type = type_name::<C>().to_string();
        let metadata = context.metadata();
        self.observers
            .notify(LifecycleEvent::PipelineWillExecute {
                command_type: command_type.clone(),
                metadata: metadata.clone(),
                pipeline_type: self.pipeline_type.clone(),
            })
            .await;

        let sink: Arc<dyn EventSink> = self.observers.clone();
        context.install_event_sink(Arc::downgrade(&sink));

        let span = tracing::info_span!(
            "pipeline_execute",
            command_type = command_type.as_str(),
            correlation_id = metadata.correlation_id.as_str(),
            request_id = %metadata.request_id,
        );

        let started = Instant::now();
        let chain = self.compiled_chain();
        let result = chain.call(&command, &context).instrument(span).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => {
                self.observers
                    .notify(LifecycleEvent::PipelineDidExecute {
                        command_type,
                        metadata,
                        pipeline_type: self.pipeline_type.clone(),
                        elapsed_ms,
                    })
                    .await;
            }
            Err(error) => {
                self.observers
                    .notify(LifecycleEvent::PipelineDidFail {
                        command_type,
                        metadata,
                        pipeline_type: self.pipeline_type.clone(),
                        error: error.clone(),
                        elapsed_ms,
                    })
                    .await;
            }
        }

        drop(token); // releases the admission slot on every exit path, success or failure.
        if from_pool {
            if let Some(pool) = &self.context_pool {
                pool.checkin(context);
            }
        }

        result
    }

    async fn emit_failure(&self, context: &Context, error: &PipelineError, elapsed_ms: u64) {
        self.observers
            .notify(LifecycleEvent::PipelineDidFail {
                command_type: type_name::<C>().to_string(),
                metadata: context.metadata(),
                pipeline_type: self.pipeline_type.clone(),
                error: error.clone(),
                elapsed_ms,
            })
            .await;
    }
}
