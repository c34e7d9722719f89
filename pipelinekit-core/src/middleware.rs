// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Middleware
//!
//! The chain-link contract a compiled chain folds over. `Next<C>` is a
//! trait object rather than a boxed closure: each compiled frame is a small
//! struct holding one middleware plus an `Arc<dyn Next<C>>` for "the rest of
//! the chain," which keeps the fold's generated type flat instead of
//! nesting one closure type per middleware (the chain compiler in
//! `pipelinekit` builds these frames).

use async_trait::async_trait;

use crate::command::Command;
use crate::context::Context;
use crate::error::PipelineError;
use crate::priority::Priority;

/// The continuation a middleware invokes to run the rest of the chain (the
/// remaining middleware, then the handler). Calling it more than once per
/// `execute` is a contract violation the type does not prevent; calling it
/// zero times is a legal short-circuit.
#[async_trait]
pub trait Next<C: Command>: Send + Sync {
    async fn call(&self, command: &C, context: &Context) -> Result<C::Output, PipelineError>;
}

/// A priority-ordered wrapper around a handler invocation. Instances are
/// immutable after registration: `priority()` and `name()` are queried
/// once per compile, not once per execution.
#[async_trait]
pub trait Middleware<C: Command>: Send + Sync {
    /// Where this middleware sorts in the chain. Ascending order executes
    /// first; see [`Priority`]'s ordering.
    fn priority(&self) -> Priority;

    /// A stable name used in diagnostics (`MiddlewareFailed { name, .. }`,
    /// `middlewareWillExecute` events).
    fn name(&self) -> &str;

    /// Runs this middleware's logic, delegating to `next` for the rest of
    /// the chain. MUST call `next` at most once; MUST propagate `next`'s
    /// error unless intentionally recovering from it.
    async fn execute(
        &self,
        command: &C,
        context: &Context,
        next: &(dyn Next<C> + Sync),
    ) -> Result<C::Output, PipelineError>;
}

/// One entry of a batch invocation: the original input position plus the
/// command/context pair at that position. Batch-aware middleware that
/// forwards a reduced list keeps these indices so the executor can splice
/// elided results back at their original positions.
pub struct BatchEntry<C: Command> {
    pub index: usize,
    pub command: C,
    pub context: Context,
}

/// The batch continuation: takes the (possibly reduced) list a middleware
/// chooses to forward and returns results in the same positional order as
/// that list. Takes `entries` by value, not by reference: a `BatchEntry`
/// owns a `Context`, which is not `Clone`, so forwarding a reduced subset
/// means moving entries out of the original list rather than copying them.
#[async_trait]
pub trait BatchNext<C: Command>: Send + Sync {
    async fn call(&self, entries: Vec<BatchEntry<C>>) -> Result<Vec<C::Output>, PipelineError>;
}

/// The batch-aware extension to [`Middleware`]: an additional entry point
/// operating over a homogeneous list instead of a single command, so
/// amortizable work (e.g. a single cache round-trip) can cover the whole
/// batch instead of running once per entry.
#[async_trait]
pub trait BatchAwareMiddleware<C: Command>: Middleware<C> {
    /// Runs this middleware's batched logic. `next` is invoked with
    /// whichever subset of `entries` this middleware chooses to forward
    /// (e.g. after removing cache hits it has already resolved); the
    /// executor is responsible for merging `next`'s results back with any
    /// this middleware resolved on its own, so the final list it returns
    /// covers every original index exactly once.
    async fn execute_batch(
        &self,
        entries: Vec<BatchEntry<C>>,
        next: &(dyn BatchNext<C> + Sync),
    ) -> Result<Vec<C::Output>, PipelineError>;
}
