// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Batch Executor
//!
//! Runs a homogeneous list of `(command, context)` pairs through a
//! priority-sorted `BatchAwareMiddleware` chain, folded the same way as
//! `chain::compile`, but over whole lists instead of single commands. The
//! only shape constraint the executor itself enforces is that the final
//! result list's length matches the original input length; a middleware
//! that forwards a reduced list is responsible for merging its own
//! precomputed results back at their original indices before it returns.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use pipelinekit_core::{BatchAwareMiddleware, BatchEntry, BatchNext, Command, Handler, PipelineError};

struct TerminalBatchNext<C, H> {
    handler: Arc<H>,
    _marker: PhantomData<fn(C)>,
}

#[async_trait]
impl<C, H> BatchNext<C> for TerminalBatchNext<C, H>
where
    C: Command,
    H: Handler<C> + 'static,
{
    async fn call(&self, entries: Vec<BatchEntry<C>>) -> Result<Vec<C::Output>, PipelineError> {
        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            results.push(self.handler.handle(&entry.command, &entry.context).await?);
        }
        Ok(results)
    }
}

struct BatchMiddlewareFrame<C: Command> {
    middleware: Arc<dyn BatchAwareMiddleware<C>>,
    next: Arc<dyn BatchNext<C>>,
}

#[async_trait]
impl<C: Command> BatchNext<C> for BatchMiddlewareFrame<C> {
    async fn call(&self, entries: Vec<BatchEntry<C>>) -> Result<Vec<C::Output>, PipelineError> {
        self.middleware.execute_batch(entries, self.next.as_ref()).await
    }
}

fn compile_batch<C, H>(middleware: &[Arc<dyn BatchAwareMiddleware<C>>], handler: Arc<H>) -> Arc<dyn BatchNext<C>>
where
    C: Command,
    H: Handler<C> + 'static,
{
    let mut sorted: Vec<Arc<dyn BatchAwareMiddleware<C>>> = middleware.to_vec();
    sorted.sort_by_key(|m| m.priority());

    let mut chain: Arc<dyn BatchNext<C>> = Arc::new(TerminalBatchNext { handler, _marker: PhantomData });
    for mw in sorted.into_iter().rev() {
        chain = Arc::new(BatchMiddlewareFrame { middleware: mw, next: chain });
    }
    chain
}

/// Runs batches of a single command type through its batch-aware
/// middleware and handler.
pub struct BatchExecutor<C: Command, H: Handler<C>> {
    handler: Arc<H>,
    middleware: Vec<Arc<dyn BatchAwareMiddleware<C>>>,
}

impl<C, H> BatchExecutor<C, H>
where
    C: Command,
    H: Handler<C> + 'static,
{
    pub fn new(handler: H, middleware: Vec<Arc<dyn BatchAwareMiddleware<C>>>) -> Self {
        Self { handler: Arc::new(handler), middleware }
    }

    /// Runs `entries` through the batch chain, tagging log output with
    /// `batch_id`. Fails with `BatchShapeError` if the chain's final result
    /// count does not match the input count.
    pub async fn execute_batch(
        &self,
        batch_id: impl Into<String>,
        entries: Vec<BatchEntry<C>>,
    ) -> Result<Vec<C::Output>, PipelineError> {
        let batch_id = batch_id.into();
        let expected_len = entries.len();
        tracing::debug!(batch_id, expected_len, "executing batch");
        let started = Instant::now();

        let chain = compile_batch(&self.middleware, self.handler.clone());
        let result = chain.call(entries).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(results) if results.len() == expected_len => {
                tracing::debug!(batch_id, expected_len, elapsed_ms, "batch completed");
                Ok(results)
            }
            Ok(results) => {
                let got_len = results.len();
                tracing::warn!(batch_id, expected_len, got_len, "batch shape mismatch");
                Err(PipelineError::BatchShapeError { expected_len, got_len })
            }
            Err(error) => {
                tracing::warn!(batch_id, error = %error, elapsed_ms, "batch failed");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipelinekit_core::{Context, Middleware, Next, Priority};

    #[derive(Clone)]
    struct Double(i64);
    impl Command for Double {
        type Output = i64;
    }

    struct DoubleHandler;
    #[async_trait]
    impl Handler<Double> for DoubleHandler {
        async fn handle(&self, command: &Double, _context: &Context) -> Result<i64, PipelineError> {
            Ok(command.0 * 2)
        }
    }

    fn entries(values: &[i64]) -> Vec<BatchEntry<Double>> {
        values
            .iter()
            .enumerate()
            .map(|(index, v)| BatchEntry { index, command: Double(*v), context: Context::new() })
            .collect()
    }

    #[tokio::test]
    async fn terminal_handler_runs_over_every_entry_in_order() {
        let executor = BatchExecutor::new(DoubleHandler, vec![]);
        let results = executor.execute_batch("b1", entries(&[1, 2, 3])).await.unwrap();
        assert_eq!(results, vec![2, 4, 6]);
    }

    /// A cache stand-in: resolves even-indexed entries itself, forwards the
    /// rest, then merges both sets back at their original positions.
    struct EvenIndexCache;
    #[async_trait]
    impl Middleware<Double> for EvenIndexCache {
        fn priority(&self) -> Priority {
            Priority::PreProcessing
        }
        fn name(&self) -> &str {
            "even-index-cache"
        }
        async fn execute(
            &self,
            command: &Double,
            context: &Context,
            next: &(dyn Next<Double> + Sync),
        ) -> Result<i64, PipelineError> {
            next.call(command, context).await
        }
    }
    #[async_trait]
    impl BatchAwareMiddleware<Double> for EvenIndexCache {
        async fn execute_batch(
            &self,
            entries: Vec<BatchEntry<Double>>,
            next: &(dyn BatchNext<Double> + Sync),
        ) -> Result<Vec<i64>, PipelineError> {
            let mut cached = Vec::new();
            let mut forwarded = Vec::new();
            for entry in entries {
                if entry.index % 2 == 0 {
                    cached.push((entry.index, entry.command.0 * 2));
                } else {
                    forwarded.push(entry);
                }
            }
            let forwarded_indices: Vec<usize> = forwarded.iter().map(|e| e.index).collect();
            let forwarded_results = next.call(forwarded).await?;

            let total = cached.len() + forwarded_results.len();
            let mut merged: Vec<Option<i64>> = vec![None; total];
            for (index, value) in cached {
                merged[index] = Some(value);
            }
            for (index, value) in forwarded_indices.into_iter().zip(forwarded_results) {
                merged[index] = Some(value);
            }
            Ok(merged.into_iter().map(|v| v.expect("every index resolved exactly once")).collect())
        }
    }

    #[tokio::test]
    async fn batch_aware_middleware_can_reduce_and_reassemble_the_list() {
        let executor = BatchExecutor::new(DoubleHandler, vec![Arc::new(EvenIndexCache)]);
        let results = executor.execute_batch("b2", entries(&[10, 20, 30, 40])).await.unwrap();
        assert_eq!(results, vec![20, 40, 60, 80]);
    }

    struct ShapeBreaking;
    #[async_trait]
    impl Middleware<Double> for ShapeBreaking {
        fn priority(&self) -> Priority {
            Priority::Processing
        }
        fn name(&self) -> &str {
            "shape-breaking"
        }
        async fn execute(
            &self,
            command: &Double,
            context: &Context,
            next: &(dyn Next<Double> + Sync),
        ) -> Result<i64, PipelineError> {
            next.call(command, context).await
        }
    }
    #[async_trait]
    impl BatchAwareMiddleware<Double> for ShapeBreaking {
        async fn execute_batch(
            &self,
            mut entries: Vec<BatchEntry<Double>>,
            next: &(dyn BatchNext<Double> + Sync),
        ) -> Result<Vec<i64>, PipelineError> {
            entries.pop(); // drops an entry and forgets to account for it.
            next.call(entries).await
        }
    }

    #[tokio::test]
    async fn a_shortened_result_list_fails_with_batch_shape_error() {
        let executor = BatchExecutor::new(DoubleHandler, vec![Arc::new(ShapeBreaking)]);
        let result = executor.execute_batch("b3", entries(&[1, 2, 3])).await;
        assert!(matches!(result, Err(PipelineError::BatchShapeError { expected_len: 3, got_len: 2 })));
    }
}
