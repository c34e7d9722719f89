// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # PipelineKit Core
//!
//! The domain layer of PipelineKit: the typed `Command`/`Handler` contract,
//! the per-invocation `Context`, the `Middleware` chain contract, the
//! `Observer` lifecycle contract, and the `PipelineError` taxonomy. This
//! crate has no opinion about how a chain is compiled, how concurrency is
//! bounded, or how observers are fanned out — those are the
//! `pipelinekit` crate's job. It does not depend on an async runtime.
//!
//! ## Module Structure
//!
//! - [`command`]: `Command` / `Handler` / `ValidatableCommand` /
//!   `CacheableCommand`.
//! - [`context`]: the per-execution typed store, metadata, metrics bag, and
//!   cancellation latch.
//! - [`priority`]: the `Priority` sum type middleware are ordered by.
//! - [`middleware`]: `Middleware`, `BatchAwareMiddleware`, and the `Next`
//!   continuation contracts a chain compiler folds over.
//! - [`observer`]: the `Observer` lifecycle trait and the lifecycle event
//!   payload types.
//! - [`options`]: `PipelineOptions` and `BackPressureStrategy`, the
//!   configuration surface the core actually owns.
//! - [`error`]: `PipelineError`, the wire-stable error taxonomy.
//!
//! ## Design Principles
//!
//! Following Domain-Driven Design: entities and value objects carry their
//! own invariants, services are stateless, and nothing in this crate
//! performs I/O or touches a runtime. `pipelinekit` (the sibling
//! application/infrastructure crate) is the only place `tokio` appears in
//! this workspace.

pub mod command;
pub mod context;
pub mod error;
pub mod middleware;
pub mod observer;
pub mod options;
pub mod priority;

pub use command::{CacheableCommand, Command, Handler, ValidatableCommand};
pub use context::{CancellationToken, Context, ContextKey, ContextMetadata};
pub use error::PipelineError;
pub use middleware::{BatchAwareMiddleware, BatchEntry, BatchNext, Middleware, Next};
pub use observer::{EventSink, LifecycleEvent, Observer};
pub use options::{BackPressureStrategy, PipelineOptions};
pub use priority::Priority;
