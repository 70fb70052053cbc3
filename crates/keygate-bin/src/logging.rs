// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Tracing subscriber setup.

use std::io::IsTerminal;

use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::cli::LogFormat;
use crate::error::{BinError, BinResult};

/// Appended to every filter so transport crates stay quiet at debug.
const CLAMPS: &[&str] = &["hyper=warn", "tower=warn", "axum=info", "tokio=info"];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Installs the global subscriber.
///
/// `RUST_LOG`, when set and valid, replaces `directives`.
pub fn init_logging(directives: &str, format: LogFormat) -> BinResult<()> {
    let filter = filter_for(EnvFilter::try_from_default_env().ok(), directives)?;

    tracing_subscriber::registry()
        .with(output_layer(format).with_filter(filter))
        .try_init()
        .map_err(|e| BinError::init(format!("logging: {}", e)))
}

fn filter_for(from_env: Option<EnvFilter>, directives: &str) -> BinResult<EnvFilter> {
    let base = match from_env {
        Some(filter) => filter,
        None => EnvFilter::try_new(directives)
            .map_err(|e| BinError::config(format!("log level {:?}: {}", directives, e)))?,
    };

    Ok(CLAMPS
        .iter()
        .filter_map(|clamp| clamp.parse().ok())
        .fold(base, EnvFilter::add_directive))
}

fn output_layer(format: LogFormat) -> BoxedLayer {
    let ansi = std::io::stdout().is_terminal();
    match format {
        LogFormat::Text => fmt::layer().with_target(true).with_ansi(ansi).boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(ansi)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
    }
}
