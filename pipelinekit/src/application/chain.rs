// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chain Compiler
//!
//! Folds a priority-sorted middleware list and a handler into a single
//! callable `Next<C>`. Rather than a boxed closure built by reverse
//! iteration, each fold step is a small `Arc`-held frame struct
//! implementing `Next<C>` — one allocation per middleware, none beyond
//! that — which keeps the compiled type flat instead of nesting one
//! closure type per middleware.
//!
//! Folding naturally specializes: a handler with no middleware compiles to
//! the handler frame alone, and one middleware produces exactly one frame
//! wrapping it, with no separate code path required for those cases.
//!
//! Each frame also emits the `middlewareWill/Did(Fail)Execute` and
//! `handlerWill/Did(Fail)Execute` lifecycle events around its inner call,
//! since the observer registry is the one component every frame can see
//! without requiring individual `Middleware` implementations to know it
//! exists.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use pipelinekit_core::observer::LifecycleEvent;
use pipelinekit_core::{Command, Context, Handler, Middleware, Next, PipelineError};

use crate::infrastructure::observer::ObserverRegistry;

struct HandlerFrame<C, H> {
    handler: Arc<H>,
    observers: Arc<ObserverRegistry>,
    command_type: &'static str,
    _marker: PhantomData<fn(C)>,
}

#[async_trait]
impl<C, H> Next<C> for HandlerFrame<C, H>
where
    C: Command,
    H: Handler<C> + 'static,
{
    async fn call(&self, command: &C, context: &Context) -> Result<C::Output, PipelineError> {
        let correlation_id = context.correlation_id();
        self.observers
            .notify(LifecycleEvent::HandlerWillExecute {
                command_type: self.command_type.to_string(),
                correlation_id: correlation_id.clone(),
            })
            .await;

        let result = self.handler.handle(command, context).await;

        match &result {
            Ok(_) => {
                self.observers
                    .notify(LifecycleEvent::HandlerDidExecute {
                        command_type: self.command_type.to_string(),
                        correlation_id,
                    })
                    .await;
            }
            Err(error) => {
                self.observers
                    .notify(LifecycleEvent::HandlerDidFail {
                        command_type: self.command_type.to_string(),
                        correlation_id,
                        error: error.clone(),
                    })
                    .await;
            }
        }

        result
    }
}

struct MiddlewareFrame<C: Command> {
    middleware: Arc<dyn Middleware<C>>,
    next: Arc<dyn Next<C>>,
    observers: Arc<ObserverRegistry>,
    command_type: &'static str,
}

#[async_trait]
impl<C: Command> Next<C> for MiddlewareFrame<C> {
    async fn call(&self, command: &C, context: &Context) -> Result<C::Output, PipelineError> {
        let correlation_id = context.correlation_id();
        let middleware_name = self.middleware.name().to_string();

        self.observers
            .notify(LifecycleEvent::MiddlewareWillExecute {
                middleware_name: middleware_name.clone(),
                command_type: self.command_type.to_string(),
                correlation_id: correlation_id.clone(),
            })
            .await;

        let result = self.middleware.execute(command, context, self.next.as_ref()).await;

        match &result {
            Ok(_) => {
                self.observers
                    .notify(LifecycleEvent::MiddlewareDidExecute {
                        middleware_name,
                        command_type: self.command_type.to_string(),
                        correlation_id,
                    })
                    .await;
            }
            Err(error) => {
                self.observers
                    .notify(LifecycleEvent::MiddlewareDidFail {
                        middleware_name,
                        command_type: self.command_type.to_string(),
                        correlation_id,
                        error: error.clone(),
                    })
                    .await;
            }
        }

        result
    }
}

/// Stable-sorts `middleware` by ascending priority (ties preserve
/// insertion order) and folds it right-to-left around `handler`, wrapping
/// every frame with lifecycle event emission through `observers`.
pub fn compile<C, H>(
    middleware: &[Arc<dyn Middleware<C>>],
    handler: Arc<H>,
    observers: Arc<ObserverRegistry>,
) -> Arc<dyn Next<C>>
where
    C: Command,
    H: Handler<C> + 'static,
{
    let mut sorted: Vec<Arc<dyn Middleware<C>>> = middleware.to_vec();
    sorted.sort_by_key(|m| m.priority());
    let command_type = std::any::type_name::<C>();

    let mut chain: Arc<dyn Next<C>> = Arc::new(HandlerFrame {
        handler,
        observers: observers.clone(),
        command_type,
        _marker: PhantomData,
    });
    for mw in sorted.into_iter().rev() {
        chain = Arc::new(MiddlewareFrame {
            middleware: mw,
            next: chain,
            observers: observers.clone(),
            command_type,
        });
    }
    chain
}
