// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Infrastructure: the runtime-owning pieces the domain crate has no
//! opinion about. `gate` bounds concurrency; `observer` fans lifecycle
//! events out; `tracing_observer` and `logging_middleware` are the
//! first-party `tracing` bridges built on top of those contracts.

pub mod context_pool;
pub mod gate;
pub mod logging_middleware;
pub mod observer;
pub mod tracing_observer;

pub use context_pool::ContextPool;
pub use gate::{AdmissionToken, ConcurrencyGate};
pub use logging_middleware::LoggingMiddleware;
pub use observer::{ConditionalObserver, FailureOnlyObserver, ObserverErrorHandler, ObserverRegistry};
pub use tracing_observer::TracingObserver;
