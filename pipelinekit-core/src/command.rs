// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command / Handler Contract
//!
//! A `Command` is an immutable, thread-safe, cloneable-by-value request; its
//! `Output` associated type is the result the handler produces. A pipeline is
//! built around exactly one `Command` implementor and exactly one `Handler`
//! for it, so the compiler rules out routing a command to the wrong handler
//! — the runtime-polymorphic case (`ConcurrentPipeline`) is where a checked
//! downcast and `IncompatibleCommand` come into play instead.

use async_trait::async_trait;

use crate::context::Context;
use crate::error::PipelineError;

/// A typed unit of work. Commands carry no behavior of their own beyond the
/// result type they produce; everything else is middleware or handler.
pub trait Command: Clone + Send + Sync + 'static {
    /// The result type the bound handler produces for this command.
    type Output: Send + 'static;
}

/// The terminal step of a chain: exactly one `Handler` per `Command` type
/// per pipeline.
#[async_trait]
pub trait Handler<C: Command>: Send + Sync {
    /// Executes the command, producing its result or failing with a
    /// `PipelineError` (typically `HandlerFailed`).
    async fn handle(&self, command: &C, context: &Context) -> Result<C::Output, PipelineError>;
}

/// Opt-in capability: a command that can validate itself before a pipeline
/// runs it. Validation middleware calls this; the core does not invoke it
/// implicitly.
pub trait ValidatableCommand: Command {
    /// Returns `Ok(())` if the command is well-formed, or
    /// `Err(PipelineError::ValidationFailed)` describing why not.
    fn validate(&self) -> Result<(), PipelineError>;
}

/// Opt-in capability: a command that yields a stable fingerprint, letting
/// caching middleware key a cache entry on command identity rather than on
/// an externally-supplied key.
pub trait CacheableCommand: Command {
    /// A fingerprint stable across equal commands and process restarts.
    fn cache_key(&self) -> String;
}
