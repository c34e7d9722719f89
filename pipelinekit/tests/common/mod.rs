// /////////////////////////////////////////////////////////////////////////////
// PipelineKit
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared test harness bootstrap.

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a `tracing` subscriber once per test binary, so gate rejections,
/// middleware entry/exit, and span output are visible with `cargo test --
/// --nocapture`. Mirrors the CLI's verbosity-level bootstrap, fixed at
/// `DEBUG` since every test run wants the noisier level.
pub fn init_tracing() {
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
