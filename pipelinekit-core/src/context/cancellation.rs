// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cancellation Latch
//!
//! A boolean latch propagated from the caller's scope into a `Context`.
//! Cancellation here is cooperative: the latch never interrupts a suspended
//! middleware on its own, it is something a middleware SHOULD check at its
//! own suspension points. The concurrency gate's queue-eviction cancellation
//! is a separate, preemptive mechanism owned by `pipelinekit`'s gate, since
//! it needs an async runtime to wake a parked waiter; this latch only needs
//! to be readable from any thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply-cloneable, monotonic cancellation flag: `false -> true` only,
/// repeated `cancel()` calls are a no-op past the first.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a fresh, not-yet-cancelled token.
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)) }
    }

    /// Latches the token. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Reads the latch. Once `true`, never reverts to `false`.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
