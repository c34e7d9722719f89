// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Application layer: the chain compiler, the single-command-type
//! `Pipeline` executor, the polymorphic `ConcurrentPipeline` dispatcher, and
//! the `BatchExecutor`. Everything here is built on top of the
//! `infrastructure` module's gate and observer registry.

pub mod batch;
pub mod chain;
pub mod concurrent_pipeline;
pub mod pipeline;

pub use batch::BatchExecutor;
pub use concurrent_pipeline::ConcurrentPipeline;
pub use pipeline::Pipeline;
