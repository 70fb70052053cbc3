// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

use crate::error::BinResult;

/// `keygate version`.
pub fn version() -> BinResult<()> {
    let components = [
        ("keygate", crate::VERSION),
        ("keygate-api", keygate_api::VERSION),
        ("keygate-config", keygate_config::VERSION),
    ];
    for (name, version) in components {
        println!("{:<16}{}", name, version);
    }
    println!(
        "{:<16}{}-{}",
        "platform",
        std::env::consts::ARCH,
        std::env::consts::OS
    );
    Ok(())
}
