// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging Middleware
//!
//! A worked example of a first-party `Middleware`: logs entry and exit
//! around `next`, at `Priority::PreProcessing` so it wraps as close to the
//! handler as reasonable while still seeing validation failures. Concrete
//! middleware bodies beyond this one (rate limiting, caching, retries) are
//! out of scope; this exists to demonstrate the contract, not to be a
//! complete middleware library.

use std::marker::PhantomData;
use std::time::Instant;

use async_trait::async_trait;
use pipelinekit_core::{Command, Context, Middleware, Next, PipelineError, Priority};

/// Logs `command` type name, elapsed time, and outcome around `next`,
/// through `tracing`, for any command type `C`.
pub struct LoggingMiddleware<C> {
    name: String,
    _marker: PhantomData<fn(C)>,
}

impl<C: Command> LoggingMiddleware<C> {
    pub fn new() -> Self {
        Self { name: "logging".to_string(), _marker: PhantomData }
    }
}

impl<C: Command> Default for LoggingMiddleware<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: Command> Middleware<C> for LoggingMiddleware<C> {
    fn priority(&self) -> Priority {
        Priority::PreProcessing
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        command: &C,
        context: &Context,
        next: &(dyn Next<C> + Sync),
    ) -> Result<C::Output, PipelineError> {
        let command_type = std::any::type_name::<C>();
        let correlation_id = context.correlation_id();
        tracing::debug!(command_type, correlation_id, "executing command");
        let started = Instant::now();

        let result = next.call(command, context).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::debug!(command_type, correlation_id, elapsed_ms, "command succeeded"),
            Err(error) => {
                tracing::warn!(command_type, correlation_id, elapsed_ms, error = %error, "command failed")
            }
        }

        result
    }
}
