// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Helpers shared by the integration suites.
//!
//! Every [`TestApp`] owns fresh in-memory stores, so suites may run in
//! parallel without coordinating keys.

pub mod assertions;
pub mod fixtures;
pub mod harness;

pub use assertions::*;
pub use fixtures::*;
pub use harness::*;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Routes `tracing` output through the test writer, once per process.
///
/// `RUST_LOG` overrides the default `warn,keygate_api=debug`.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,keygate_api=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Fresh scratch directory, removed on drop.
pub fn temp_test_dir(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temp directory")
}
