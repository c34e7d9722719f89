// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Concurrency Gate
//!
//! Admission control for the pipeline executor: bounds the number of
//! simultaneous in-flight executions (`max_concurrency`) and, optionally,
//! the combined in-flight-plus-queued backlog (`max_outstanding`), applying
//! one of four overflow policies when the gate is saturated.
//!
//! ## Design
//!
//! A fast path admits immediately while `in_flight < max_concurrency`. Past
//! that, each strategy routes through a single FIFO wait queue guarded by a
//! `parking_lot::Mutex` (never held across an `.await`); a parked waiter is
//! a `tokio::sync::oneshot` pair. `release` pops the queue head and wakes it
//! by sending on its channel, and admission itself is an explicit-acquire,
//! RAII-release permit, mirroring how the rest of this workspace hands out
//! scoped capabilities.
//!
//! Cancellation while queued (dropping the future returned by `acquire`
//! before it resolves) is handled by a drop guard that inspects the
//! channel: if no message was sent yet, it removes the waiter from the
//! queue; if one was already sent admitting it, it hands the slot back to
//! the next waiter instead of leaking it. This is what rules out the
//! "spurious admission" failure mode the gate must avoid.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

#[cfg(test)]
use std::time::Duration;

use parking_lot::Mutex;
use pipelinekit_core::{BackPressureStrategy, PipelineError};
use tokio::sync::oneshot;
use tokio::time::timeout;

type WaitResult = Result<(), PipelineError>;

struct Waiter {
    id: u64,
    sender: oneshot::Sender<WaitResult>,
}

struct GateState {
    in_flight: usize,
    waiters: VecDeque<Waiter>,
    next_id: u64,
}

/// A future wrapping a waiter's `oneshot::Receiver` that, if dropped before
/// resolving, tells whether the waiter was still queued (remove it) or had
/// already been admitted and abandoned (hand the slot to the next waiter).
struct Cleanup {
    gate: Arc<GateInner>,
    id: u64,
    rx: oneshot::Receiver<WaitResult>,
}

impl Future for Cleanup {
    type Output = Result<WaitResult, oneshot::error::RecvError>;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx).poll(cx)
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        match self.rx.try_recv() {
            Ok(Ok(())) => self.gate.return_slot(),
            Ok(Err(_)) | Err(oneshot::error::TryRecvError::Closed) => {}
            Err(oneshot::error::TryRecvError::Empty) => self.gate.remove_waiter(self.id),
        }
    }
}

struct GateInner {
    max_concurrency: Option<usize>,
    max_outstanding: Option<usize>,
    strategy: BackPressureStrategy,
    state: Mutex<GateState>,
}

impl GateInner {
    /// Returns a slot to circulation: hands it to the next waiter in FIFO
    /// order if one exists, otherwise reduces `in_flight`.
    fn return_slot(&self) {
        let mut state = self.state.lock();
        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.sender.send(Ok(())).is_ok() {
                return;
            }
            // The waiter's receiver was already dropped (it cancelled
            // independently of admission); keep looking for a live one.
        }
        state.in_flight = state.in_flight.saturating_sub(1);
    }

    fn remove_waiter(&self, id: u64) {
        let mut state = self.state.lock();
        if let Some(pos) = state.waiters.iter().position(|w| w.id == id) {
            state.waiters.remove(pos);
        }
    }
}

/// An async semaphore with four overflow policies. See the module docs for
/// the admission algorithm.
#[derive(Clone)]
pub struct ConcurrencyGate {
    inner: Arc<GateInner>,
}

impl ConcurrencyGate {
    pub fn new(max_concurrency: Option<usize>, max_outstanding: Option<usize>, strategy: BackPressureStrategy) -> Self {
        Self {
            inner: Arc::new(GateInner {
                max_concurrency,
                max_outstanding,
                strategy,
                state: Mutex::new(GateState { in_flight: 0, waiters: VecDeque::new(), next_id: 0 }),
            }),
        }
    }

    /// The number of currently in-flight executions.
    pub fn in_flight(&self) -> usize {
        self.inner.state.lock().in_flight
    }

    /// The number of executions currently parked in the wait queue.
    pub fn waiting(&self) -> usize {
        self.inner.state.lock().waiters.len()
    }

    /// Admits the caller, applying the configured overflow strategy if the
    /// gate is saturated. Dropping the returned future before it resolves
    /// is a safe cancellation: no slot is leaked.
    pub async fn acquire(&self) -> Result<AdmissionToken, PipelineError> {
        let Some(max_concurrency) = self.inner.max_concurrency else {
            // Unbounded: admit unconditionally, strategy never applies.
            self.inner.state.lock().in_flight += 1;
            return Ok(AdmissionToken { gate: Some(self.inner.clone()) });
        };

        let mut state = self.inner.state.lock();
        if state.in_flight < max_concurrency {
            state.in_flight += 1;
            return Ok(AdmissionToken { gate: Some(self.inner.clone()) });
        }

        match self.inner.strategy {
            BackPressureStrategy::Suspend => {
                let (id, rx) = self.enqueue(&mut state);
                drop(state);
                self.park(id, rx).await
            }
            BackPressureStrategy::Error { timeout: budget } => {
                // `max_outstanding` is ignored here, same as `Suspend`: every
                // arrival queues and waits out its timeout budget rather than
                // being rejected for backlog size. There is no `QueueFull`
                // path under this strategy.
                let (id, rx) = self.enqueue(&mut state);
                drop(state);
                let started = Instant::now();
                match timeout(budget, self.park(id, rx)).await {
                    Ok(result) => result,
                    Err(_) => {
                        let elapsed_ms = started.elapsed().as_millis() as u64;
                        tracing::warn!(max_concurrency, elapsed_ms, "gate admission timed out");
                        Err(PipelineError::Timeout { elapsed_ms })
                    }
                }
            }
            BackPressureStrategy::DropOldest => {
                // An unset `max_outstanding` is treated as a backlog capacity
                // of zero: with no stated bound, nothing past `max_concurrency`
                // is allowed to queue at all, so every new arrival evicts
                // whatever is already waiting.
                let backlog_cap = self.inner.max_outstanding.map_or(0, |cap| cap.saturating_sub(max_concurrency));
                if state.waiters.len() >= backlog_cap {
                    if let Some(evicted) = state.waiters.pop_front() {
                        tracing::warn!(max_concurrency, "gate evicted the oldest queued waiter");
                        let _ = evicted.sender.send(Err(PipelineError::Dropped));
                    }
                }
                let (id, rx) = self.enqueue(&mut state);
                drop(state);
                self.park(id, rx).await
            }
            BackPressureStrategy::DropNewest => {
                tracing::warn!(max_concurrency, "gate rejected the newest arrival");
                Err(PipelineError::Dropped)
            }
        }
    }

    fn enqueue(&self, state: &mut GateState) -> (u64, oneshot::Receiver<WaitResult>) {
        let id = state.next_id;
        state.next_id += 1;
        let (tx, rx) = oneshot::channel();
        state.waiters.push_back(Waiter { id, sender: tx });
        (id, rx)
    }

    /// Awaits admission for a queued waiter, guaranteeing that dropping
    /// this future early neither leaks a slot nor leaves the waiter parked
    /// forever: [`Cleanup::drop`] inspects the channel to tell apart "still
    /// queued" from "admitted but abandoned."
    async fn park(&self, id: u64, rx: oneshot::Receiver<WaitResult>) -> Result<AdmissionToken, PipelineError> {
        let result = Cleanup { gate: self.inner.clone(), id, rx }.await;
        match result {
            Ok(Ok(())) => Ok(AdmissionToken { gate: Some(self.inner.clone()) }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PipelineError::Cancelled(format!("gate waiter {id} sender dropped"))),
        }
    }
}

/// An RAII admission capability. Releases its concurrency slot when
/// dropped, handing it to the next FIFO waiter if one is parked. Not
/// `Clone`: exactly one token per admitted execution.
pub struct AdmissionToken {
    gate: Option<Arc<GateInner>>,
}

impl Drop for AdmissionToken {
    fn drop(&mut self) {
        if let Some(gate) = self.gate.take() {
            gate.return_slot();
        }
    }
}
