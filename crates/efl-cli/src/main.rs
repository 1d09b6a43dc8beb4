// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Entry point, grounded on `fluxion-upgrader::main`'s tracing init + sequential
//! `anyhow::Context`-wrapped steps; the subcommand shape is `fluxion-strategy-simulator`'s.

mod cli;

use anyhow::Context;
use clap::Parser;
use efl_types::EngineConfig;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = EngineConfig::load(&cli.config)
        .with_context(|| format!("loading engine config from {}", cli.config.display()))?;

    match cli.command {
        Commands::Parse(args) => cli::commands::run_parse(&args, &config).context("running parse")?,
        Commands::RunHome(args) => cli::commands::run_run_home(&args, &config).await.context("running run-home")?,
        Commands::ReplayJob(args) => cli::commands::run_replay_job(&args).context("running replay-job")?,
    }

    Ok(())
}
