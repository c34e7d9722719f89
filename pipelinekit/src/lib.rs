// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # PipelineKit
//!
//! The application/infrastructure layer built on top of `pipelinekit-core`'s
//! domain types: a [`ConcurrencyGate`](infrastructure::ConcurrencyGate) for
//! admission control, an [`ObserverRegistry`](infrastructure::ObserverRegistry)
//! for lifecycle fan-out, a chain compiler, and the
//! [`Pipeline`](application::Pipeline) executor that ties them together.
//! This is the one crate in the workspace that depends on `tokio`.
//!
//! ## Module Structure
//!
//! - [`infrastructure`]: the concurrency gate, the observer registry and its
//!   composable wrappers, a first-party `tracing` observer, a worked
//!   example logging middleware, and the context pool.
//! - [`application`]: the chain compiler, the `Pipeline` executor, the
//!   polymorphic `ConcurrentPipeline` dispatcher, and the batch executor.
//!
//! ## Quick start
//!
//! ```ignore
//! use pipelinekit::application::Pipeline;
//! use pipelinekit_core::PipelineOptions;
//!
//! let pipeline = Pipeline::new(my_handler, PipelineOptions::unbounded());
//! pipeline.add_middleware(std::sync::Arc::new(my_middleware));
//! let result = pipeline.execute(my_command, None).await?;
//! ```

pub mod application;
pub mod infrastructure;

pub use application::{BatchExecutor, ConcurrentPipeline, Pipeline};
pub use infrastructure::{AdmissionToken, ConcurrencyGate, ContextPool, ObserverRegistry, TracingObserver};

// Re-export the domain types callers need alongside the above, so a
// consumer of this crate alone rarely needs a direct `pipelinekit-core`
// dependency.
pub use pipelinekit_core::{
    BackPressureStrategy, CacheableCommand, CancellationToken, Command, Context, ContextKey, ContextMetadata, Handler,
    Middleware, Next, PipelineError, PipelineOptions, Priority, ValidatableCommand,
};
