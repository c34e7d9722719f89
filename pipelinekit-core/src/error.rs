// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Error Taxonomy
//!
//! `PipelineError` is PipelineKit's wire-stable error surface. Every failure
//! mode the core can produce — gate rejection, chain short-circuit, batch
//! shape mismatch, dispatcher misrouting — is a variant here, so a caller
//! never needs to downcast an opaque error to decide how to react.
//!
//! Errors are `Clone` so the same value can be handed to an `Observer` for
//! `pipelineDidFail` and returned to the caller without an extra allocation
//! for the common case.

use thiserror::Error;

/// Errors produced by the pipeline dispatch core.
///
/// Categorized per the wire-level taxonomy: gate admission failures
/// (`Timeout`, `QueueFull`, `Dropped`), dispatch failures (`NoHandler`,
/// `IncompatibleCommand`), chain failures (`ValidationFailed`,
/// `HandlerFailed`, `MiddlewareFailed`), and shape failures
/// (`BatchShapeError`).
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// The execution was cancelled, either while queued at the gate or
    /// mid-chain.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Admission timed out under the `Error(timeout)` back-pressure
    /// strategy.
    #[error("timed out waiting for admission after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The gate's backlog was full and the strategy does not queue past
    /// capacity.
    #[error("admission queue is full")]
    QueueFull,

    /// The execution was evicted from the gate's wait queue by a newer
    /// arrival (`DropOldest`) or rejected outright (`DropNewest`).
    #[error("dropped due to back-pressure")]
    Dropped,

    /// No pipeline is registered for this command type in a
    /// `ConcurrentPipeline`.
    #[error("no handler registered for command type `{command_type}`")]
    NoHandler { command_type: String },

    /// A `ConcurrentPipeline` resolved a pipeline whose handler expects a
    /// different command type than the one submitted.
    #[error("incompatible command: expected `{expected}`, got `{got}`")]
    IncompatibleCommand { expected: String, got: String },

    /// A `ValidatableCommand::validate` call rejected the command.
    #[error("validation failed: {details}")]
    ValidationFailed { details: String },

    /// The terminal handler returned an error.
    #[error("handler failed: {inner}")]
    HandlerFailed { inner: String },

    /// A middleware in the chain returned an error it did not recover from.
    #[error("middleware `{name}` failed: {inner}")]
    MiddlewareFailed { name: String, inner: String },

    /// A batch-aware middleware (or the batch executor itself) returned a
    /// result list whose length did not match the input it was handed.
    #[error("batch shape error: expected {expected_len} results, got {got_len}")]
    BatchShapeError { expected_len: usize, got_len: usize },

    /// An invariant the core relies on was violated — a bug, not a caller
    /// error.
    #[error("internal error: {0}")]
    InternalError(String),
}

impl PipelineError {
    /// Creates a `HandlerFailed` wrapping an arbitrary error's display form.
    pub fn handler_failed(inner: impl std::fmt::Display) -> Self {
        Self::HandlerFailed { inner: inner.to_string() }
    }

    /// Creates a `MiddlewareFailed` naming the offending middleware.
    pub fn middleware_failed(name: impl Into<String>, inner: impl std::fmt::Display) -> Self {
        Self::MiddlewareFailed { name: name.into(), inner: inner.to_string() }
    }

    /// Creates a `ValidationFailed` from a detail message.
    pub fn validation_failed(details: impl Into<String>) -> Self {
        Self::ValidationFailed { details: details.into() }
    }

    /// Creates an `InternalError` from a detail message.
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Whether the failure indicates a transient condition worth retrying
    /// (gate admission pressure), as opposed to a permanent rejection.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::Timeout { .. } | PipelineError::QueueFull | PipelineError::Dropped)
    }

    /// A short, stable category name for logging and metrics tagging.
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::Cancelled(_) => "cancellation",
            PipelineError::Timeout { .. } => "timeout",
            PipelineError::QueueFull => "queue_full",
            PipelineError::Dropped => "dropped",
            PipelineError::NoHandler { .. } => "no_handler",
            PipelineError::IncompatibleCommand { .. } => "incompatible_command",
            PipelineError::ValidationFailed { .. } => "validation",
            PipelineError::HandlerFailed { .. } => "handler",
            PipelineError::MiddlewareFailed { .. } => "middleware",
            PipelineError::BatchShapeError { .. } => "batch_shape",
            PipelineError::InternalError(_) => "internal",
        }
    }
}
