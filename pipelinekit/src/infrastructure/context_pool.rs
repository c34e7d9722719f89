// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Context Pool
//!
//! An optional bounded free-list of [`Context`] values, enabled per
//! `PipelineOptions::use_context_pool`. Checkout pops a recycled context if
//! one is sitting in the pool, otherwise allocates fresh; check-in calls
//! [`Context::recycle`] (clearing the store/metadata/metrics and rearming
//! the cancellation latch) before returning it to the free list, so a
//! checked-out context is never observably different from a brand new one.
//! Guarded by a `parking_lot::Mutex`, following the same "mutually
//! exclusive critical section, never held across an `.await`" discipline as
//! the concurrency gate.

use parking_lot::Mutex;
use pipelinekit_core::Context;

/// A bounded pool of reusable [`Context`] values.
pub struct ContextPool {
    slots: Mutex<Vec<Context>>,
    capacity: usize,
}

impl ContextPool {
    /// Creates an empty pool that retains at most `capacity` contexts
    /// between uses.
    pub fn new(capacity: usize) -> Self {
        Self { slots: Mutex::new(Vec::with_capacity(capacity)), capacity }
    }

    /// Takes a context from the pool, recycled and ready to use, or
    /// allocates a fresh one if the pool is empty.
    pub fn checkout(&self) -> Context {
        self.slots.lock().pop().unwrap_or_default()
    }

    /// Returns `context` to the pool after recycling it. Dropped instead of
    /// retained once the pool is at capacity.
    pub fn checkin(&self, mut context: Context) {
        context.recycle();
        let mut slots = self.slots.lock();
        if slots.len() < self.capacity {
            slots.push(context);
        }
    }

    /// The number of contexts currently sitting idle in the pool.
    pub fn idle(&self) -> usize {
        self.slots.lock().len()
    }
}
