// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Options
//!
//! The configuration surface the core itself owns: concurrency gate bounds
//! and overflow policy, plus whether contexts are pooled. Everything else a
//! deployment might configure (log format, metrics exporter endpoint, CLI
//! flags) belongs to an outer, collaborator layer and is out of scope here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The gate's overflow policy once `max_concurrency` is saturated. See the
/// concurrency gate's admission table for the exact behavior of each
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BackPressureStrategy {
    /// Park the caller until a slot frees up. Ignores `max_outstanding`:
    /// the wait queue is unbounded under this strategy.
    Suspend,

    /// Park the caller with an admission timer; fails with
    /// `PipelineError::Timeout` if no slot frees up before `timeout`
    /// elapses.
    Error { timeout: Duration },

    /// Evict the head of the wait queue (failing it with
    /// `PipelineError::Dropped`) to make room for the newest arrival once
    /// the backlog is at capacity.
    DropOldest,

    /// Reject the newest arrival outright (`PipelineError::Dropped`) once
    /// the backlog is at capacity.
    DropNewest,
}

impl BackPressureStrategy {
    /// The `Error` variant with `timeout_seconds` converted to a
    /// [`Duration`], for callers that prefer to express the admission
    /// timeout in fractional seconds rather than constructing a `Duration`
    /// directly.
    pub fn error_after_secs(timeout_seconds: f64) -> Self {
        Self::Error { timeout: Duration::from_secs_f64(timeout_seconds.max(0.0)) }
    }
}

impl Default for BackPressureStrategy {
    fn default() -> Self {
        Self::Suspend
    }
}

/// Construction-time configuration for a `Pipeline`. `pipelinekit-core`
/// only defines the shape; reading this from a file or environment is an
/// outer-layer concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Maximum simultaneous in-flight executions. `None` means unbounded
    /// (no gate is installed).
    pub max_concurrency: Option<usize>,

    /// Maximum of in-flight plus queued executions. `None` means an
    /// unbounded backlog (only meaningful under `Suspend`/`Error`; the
    /// `Drop*` strategies treat an absent bound as "evict/reject
    /// immediately once `max_concurrency` is saturated").
    pub max_outstanding: Option<usize>,

    /// The gate's overflow policy.
    pub back_pressure_strategy: BackPressureStrategy,

    /// Whether `Context` instances are drawn from a pool rather than
    /// allocated fresh per execution.
    pub use_context_pool: bool,
}

impl PipelineOptions {
    /// Unbounded concurrency, no pooling — the default for pipelines that
    /// don't need to exercise the gate at all.
    pub fn unbounded() -> Self {
        Self {
            max_concurrency: None,
            max_outstanding: None,
            back_pressure_strategy: BackPressureStrategy::default(),
            use_context_pool: false,
        }
    }

    /// A bounded pipeline under a given strategy, with no outstanding cap.
    pub fn bounded(max_concurrency: usize, back_pressure_strategy: BackPressureStrategy) -> Self {
        Self { max_concurrency: Some(max_concurrency), max_outstanding: None, back_pressure_strategy, use_context_pool: false }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_options_have_no_gate_bounds() {
        let opts = PipelineOptions::unbounded();
        assert!(opts.max_concurrency.is_none());
        assert!(opts.max_outstanding.is_none());
    }

    #[test]
    fn error_after_secs_converts_to_a_duration() {
        match BackPressureStrategy::error_after_secs(0.1) {
            BackPressureStrategy::Error { timeout } => assert_eq!(timeout, Duration::from_millis(100)),
            other => panic!("expected Error variant, got {other:?}"),
        }
    }

    #[test]
    fn bounded_sets_max_concurrency_and_strategy() {
        let opts = PipelineOptions::bounded(4, BackPressureStrategy::DropOldest);
        assert_eq!(opts.max_concurrency, Some(4));
        assert_eq!(opts.back_pressure_strategy, BackPressureStrategy::DropOldest);
    }
}
