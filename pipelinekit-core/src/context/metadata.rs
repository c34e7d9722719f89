// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Context Metadata
//!
//! The lifecycle-tracking fields every execution carries: a correlation id
//! threaded through all of an execution's lifecycle events, a request id,
//! wall-clock timestamp, optional user id, and an open string→string tag map
//! for application-specific annotations. `fork_metadata` produces the
//! `trace_id`/`parent_span_id` linkage a child span needs to point back at
//! its parent.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-execution metadata: identity, timing, and free-form tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextMetadata {
    /// Stable across an execution's entire lifecycle event stream.
    /// Inherited from a parent scope when one exists, generated otherwise.
    pub correlation_id: String,

    /// The principal this execution is acting on behalf of, if known.
    pub user_id: Option<String>,

    /// Unique to this single execution.
    pub request_id: Uuid,

    /// When the context was created.
    pub timestamp: DateTime<Utc>,

    /// Arbitrary application-supplied annotations.
    pub tags: HashMap<String, String>,

    /// Tracing span id this execution belongs to, if `fork_metadata` has
    /// been called on an ancestor.
    pub trace_id: Option<String>,

    /// The immediate parent span id, set only on metadata produced by
    /// `fork_metadata`.
    pub parent_span_id: Option<String>,
}

impl ContextMetadata {
    /// Creates fresh metadata with a generated `correlation_id` and
    /// `request_id`.
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            user_id: None,
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            tags: HashMap::new(),
            trace_id: None,
            parent_span_id: None,
        }
    }

    /// Creates metadata inheriting an existing correlation id (e.g. from a
    /// caller's scope), still minting a fresh `request_id` for this
    /// execution.
    pub fn with_correlation_id(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into(), ..Self::new() }
    }

    /// A span context describing a child operation of this metadata's
    /// execution: same `correlation_id`, a freshly minted `trace_id`, and
    /// `parent_span_id` pointing at this metadata's own `trace_id` (or
    /// `request_id` if this metadata has not itself been forked from
    /// anything).
    pub fn fork_metadata(&self, operation_name: impl Into<String>) -> SpanContext {
        let parent_span_id = self.trace_id.clone().unwrap_or_else(|| self.request_id.to_string());
        SpanContext {
            operation_name: operation_name.into(),
            trace_id: Uuid::new_v4().to_string(),
            parent_span_id,
            correlation_id: self.correlation_id.clone(),
        }
    }
}

impl Default for ContextMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// A child tracing span produced by [`ContextMetadata::fork_metadata`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanContext {
    pub operation_name: String,
    pub trace_id: String,
    pub parent_span_id: String,
    pub correlation_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_metadata_has_no_parent_span() {
        let meta = ContextMetadata::new();
        assert!(meta.trace_id.is_none());
        assert!(meta.parent_span_id.is_none());
    }

    #[test]
    fn fork_metadata_links_parent_and_child() {
        let meta = ContextMetadata::new();
        let span = meta.fork_metadata("validate");
        assert_eq!(span.parent_span_id, meta.request_id.to_string());
        assert_eq!(span.correlation_id, meta.correlation_id);
        assert_ne!(span.trace_id, span.parent_span_id);
    }

    #[test]
    fn inherited_correlation_id_is_preserved() {
        let meta = ContextMetadata::with_correlation_id("caller-abc");
        assert_eq!(meta.correlation_id, "caller-abc");
    }
}
