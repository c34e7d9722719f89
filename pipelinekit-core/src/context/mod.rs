// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Context
//!
//! The per-invocation, mutable environment shared by every middleware in one
//! execution: a typed heterogeneous store, lifecycle metadata, a metrics
//! bag, a cancellation latch, and a weak back-reference to the observer
//! registry so nested middleware can emit `customEvent`s without the
//! context owning (and therefore outliving) the registry.
//!
//! A `Context` belongs to exactly one in-flight execution — concurrently
//! executing on the same `Context` from two executions is a programming
//! error the type does not prevent; it is documented as an invariant rather
//! than enforced at the type level, since an exclusive borrow across
//! `.await` points does not compose with a trait-object `Next` chain.

mod cancellation;
mod metadata;
mod store;

pub use cancellation::CancellationToken;
pub use metadata::{ContextMetadata, SpanContext};
pub use store::{ContextKey, TypedStore};

use std::collections::HashMap;
use std::sync::Weak;

use parking_lot::RwLock;

use crate::observer::EventSink;

/// The per-execution environment threaded through a middleware chain.
pub struct Context {
    store: TypedStore,
    metadata: RwLock<ContextMetadata>,
    metrics: RwLock<HashMap<String, f64>>,
    cancellation: CancellationToken,
    event_sink: RwLock<Option<Weak<dyn EventSink>>>,
}

impl Context {
    /// A fresh context with generated metadata and an unlatched
    /// cancellation token.
    pub fn new() -> Self {
        Self {
            store: TypedStore::new(),
            metadata: RwLock::new(ContextMetadata::new()),
            metrics: RwLock::new(HashMap::new()),
            cancellation: CancellationToken::new(),
            event_sink: RwLock::new(None),
        }
    }

    /// A context inheriting a caller-supplied correlation id.
    pub fn with_correlation_id(correlation_id: impl Into<String>) -> Self {
        Self { metadata: RwLock::new(ContextMetadata::with_correlation_id(correlation_id)), ..Self::new() }
    }

    // --- Typed store -----------------------------------------------------

    /// Stores `value` under key type `K`, visible to every middleware that
    /// runs after this call returns on the same execution.
    pub fn set<K: ContextKey>(&self, value: K::Value) {
        self.store.set::<K>(value);
    }

    /// Reads the value stored under key type `K`, if any.
    pub fn get<K: ContextKey>(&self) -> Option<K::Value>
    where
        K::Value: Clone,
    {
        self.store.get::<K>()
    }

    /// Removes and returns the value stored under key type `K`, if any.
    pub fn remove<K: ContextKey>(&self) -> Option<K::Value> {
        self.store.remove::<K>()
    }

    /// Whether key type `K` currently has a value.
    pub fn contains<K: ContextKey>(&self) -> bool {
        self.store.contains::<K>()
    }

    // --- Metadata ----------------------------------------------------------

    /// A snapshot of the current metadata.
    pub fn metadata(&self) -> ContextMetadata {
        self.metadata.read().clone()
    }

    /// Runs `f` with exclusive access to the metadata for in-place updates
    /// (e.g. setting `user_id` or adding a tag).
    pub fn metadata_mut<R>(&self, f: impl FnOnce(&mut ContextMetadata) -> R) -> R {
        f(&mut self.metadata.write())
    }

    /// The correlation id threaded through this execution's lifecycle
    /// events. Shorthand for `metadata().correlation_id`.
    pub fn correlation_id(&self) -> String {
        self.metadata.read().correlation_id.clone()
    }

    /// Creates a child span context rooted at this context's metadata. See
    /// [`ContextMetadata::fork_metadata`].
    pub fn fork_metadata(&self, operation_name: impl Into<String>) -> SpanContext {
        self.metadata.read().fork_metadata(operation_name)
    }

    // --- Metrics -------------------------------------------------------------

    /// Runs `f` with exclusive access to the metrics bag.
    pub fn metrics_mut<R>(&self, f: impl FnOnce(&mut HashMap<String, f64>) -> R) -> R {
        f(&mut self.metrics.write())
    }

    /// A snapshot of the current metrics bag.
    pub fn metrics(&self) -> HashMap<String, f64> {
        self.metrics.read().clone()
    }

    // --- Cancellation --------------------------------------------------------

    /// Latches this execution's cancellation token. Idempotent.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether this execution has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// The underlying cancellation token, for middleware that wants to hold
    /// on to it across a suspension point rather than re-checking the
    /// context.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    // --- Observer back-reference --------------------------------------------

    /// Installs the (weak) observer registry reference. Called once by the
    /// pipeline executor at entry; never by middleware.
    pub fn install_event_sink(&self, sink: Weak<dyn EventSink>) {
        *self.event_sink.write() = Some(sink);
    }

    /// Emits a custom lifecycle event through the installed registry, if
    /// its strong reference is still alive and one was installed.
    pub async fn emit_custom(&self, name: &str) {
        let sink = self.event_sink.read().clone();
        if let Some(weak) = sink {
            if let Some(sink) = weak.upgrade() {
                sink.emit_custom(name, &self.correlation_id()).await;
            }
        }
    }

    /// Resets every piece of mutable state to fresh defaults, preserving no
    /// identity. Used by a context pool before re-issue: the typed
    /// store is cleared, metadata and metrics are replaced, and the
    /// cancellation latch is replaced with a fresh, un-latched one since a
    /// latch can only go `false -> true`.
    pub fn reset(&self) {
        self.store.clear();
        *self.metadata.write() = ContextMetadata::new();
        self.metrics.write().clear();
        *self.event_sink.write() = None;
        // The cancellation token is intentionally not reset here: it is a
        // `CancellationToken` value, not a slot, because it must remain
        // `Clone`-shareable with any task that already captured it. Pooled
        // contexts are reconstructed with a fresh token by the pool instead
        // of being reset in place; see `pipelinekit`'s context pool.
    }

    /// Resets every piece of state, including rearming the cancellation
    /// latch with a fresh token. Requires exclusive access because a
    /// `CancellationToken` can only latch `false -> true` and must be
    /// replaced outright rather than unlatched. Used by a context pool
    /// before a pooled `Context` is handed out again.
    pub fn recycle(&mut self) {
        self.reset();
        self.cancellation = CancellationToken::new();
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Seen;
    impl ContextKey for Seen {
        type Value = Vec<String>;
    }

    #[test]
    fn metadata_round_trips_through_snapshot_and_mutation() {
        let ctx = Context::new();
        ctx.metadata_mut(|m| m.user_id = Some("alice".into()));
        assert_eq!(ctx.metadata().user_id, Some("alice".into()));
    }

    #[test]
    fn typed_store_set_get_remove_cycle() {
        let ctx = Context::new();
        assert_eq!(ctx.get::<Seen>(), None);
        ctx.set::<Seen>(vec!["a".into()]);
        assert_eq!(ctx.get::<Seen>(), Some(vec!["a".into()]));
        assert_eq!(ctx.remove::<Seen>(), Some(vec!["a".into()]));
        assert_eq!(ctx.get::<Seen>(), None);
    }

    #[test]
    fn cancellation_is_monotonic_through_the_context() {
        let ctx = Context::new();
        assert!(!ctx.is_cancelled());
        ctx.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn reset_clears_store_metadata_and_metrics() {
        let ctx = Context::new();
        ctx.set::<Seen>(vec!["x".into()]);
        ctx.metrics_mut(|m| {
            m.insert("count".into(), 1.0);
        });
        let original_request_id = ctx.metadata().request_id;
        ctx.reset();
        assert_eq!(ctx.get::<Seen>(), None);
        assert!(ctx.metrics().is_empty());
        assert_ne!(ctx.metadata().request_id, original_request_id);
    }

    #[test]
    fn recycle_rearms_a_latched_cancellation_token() {
        let mut ctx = Context::new();
        ctx.cancel();
        assert!(ctx.is_cancelled());
        ctx.recycle();
        assert!(!ctx.is_cancelled());
    }
}
