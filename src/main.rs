// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `autohome-master`: the home coordinator daemon.

use std::path::PathBuf;

use autohome::{Coordinator, CoordinatorConfig};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "autohome-master", version, about = "Home-automation coordinator")]
struct Cli {
    /// Path to the JSON configuration file; built-in defaults when omitted
    #[arg(long, env = "AUTOHOME_CONFIG")]
    config: Option<PathBuf>,

    /// Ingest from the broker but only log outbound messages
    #[arg(long)]
    dry_run: bool,
}

async fn run(cli: Cli) -> autohome::Result<()> {
    let config = match &cli.config {
        Some(path) => CoordinatorConfig::load(path)?,
        None => {
            tracing::info!("No configuration file given, using defaults");
            CoordinatorConfig::default()
        }
    };

    Coordinator::new(config).dry_run(cli.dry_run).run().await
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!(error = %e, "Coordinator failed");
        std::process::exit(1);
    }
}
