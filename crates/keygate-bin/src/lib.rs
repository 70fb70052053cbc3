// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # keygate-bin
//!
//! The `keygate` executable. [`cli`] parses flags, [`logging`] installs the
//! tracing subscriber, and [`runtime`] turns a configuration file into a
//! serving [`ServerRuntime`] that [`shutdown`] stops on SIGINT or SIGTERM.
//!
//! ```bash
//! keygate -c /etc/keygate/config.yaml          # serve
//! keygate validate --show-config -f json       # check a file
//! echo -n 'correct horse' | keygate hash-secret --stdin
//! ```

#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{RuntimeBuilder, ServerRuntime, api_config_from};
pub use shutdown::ShutdownCoordinator;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
