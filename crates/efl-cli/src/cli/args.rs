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

//! CLI argument definitions, grounded on `fluxion-strategy-simulator::cli::args`'s
//! `clap` derive shape.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "efl-cli")]
#[command(author, version, about = "Electricity Plan Pricing Engine CLI")]
pub struct Cli {
    /// Path to the engine config JSON (created with defaults if missing)
    #[arg(long, global = true, value_name = "PATH", default_value = "efl-engine.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run normalize -> draft -> validate -> solve -> score against one EFL text file
    Parse(ParseArgs),

    /// Run the per-home pipeline once against a SQLite store
    RunHome(RunHomeArgs),

    /// Print the latest pipeline job snapshot for a home
    ReplayJob(ReplayJobArgs),
}

#[derive(Parser)]
pub struct ParseArgs {
    /// Path to a file containing the EFL's extracted raw text
    #[arg(long, value_name = "PATH")]
    pub efl_text: PathBuf,

    /// Disclosed average price at 500 kWh, in cents per kWh
    #[arg(long)]
    pub p500: Option<f64>,

    /// Disclosed average price at 1000 kWh, in cents per kWh
    #[arg(long)]
    pub p1000: Option<f64>,

    /// Disclosed average price at 2000 kWh, in cents per kWh
    #[arg(long)]
    pub p2000: Option<f64>,
}

#[derive(Parser)]
pub struct RunHomeArgs {
    /// Path to the SQLite store (created if missing)
    #[arg(long, value_name = "PATH")]
    pub db: PathBuf,

    #[arg(long)]
    pub home_id: String,

    #[arg(long, value_enum, default_value = "dashboard-bootstrap")]
    pub reason: ReasonArg,

    /// Last day of the 12-month usage window to estimate against (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub usage_window_end: String,

    /// Offers API base URL; omit to run with no offers (useful for dry runs)
    #[arg(long, value_name = "URL")]
    pub offers_api_base_url: Option<String>,

    /// JSON file of `{ tdspSlug: [TdspRates, ...] }` (TDSP tariff lookup is out of scope;
    /// this seeds the in-memory stand-in)
    #[arg(long, value_name = "PATH")]
    pub tdsp_rates_file: Option<PathBuf>,

    /// JSON file of `{ homeId: MonthlyUsageBuckets }` (usage ingestion is out of scope; this
    /// seeds the in-memory stand-in)
    #[arg(long, value_name = "PATH")]
    pub usage_buckets_file: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ReplayJobArgs {
    #[arg(long, value_name = "PATH")]
    pub db: PathBuf,

    #[arg(long)]
    pub home_id: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReasonArg {
    MonthlyRefresh,
    PlansFallback,
    DashboardBootstrap,
}

impl From<ReasonArg> for efl_types::PipelineReason {
    fn from(value: ReasonArg) -> Self {
        match value {
            ReasonArg::MonthlyRefresh => efl_types::PipelineReason::MonthlyRefresh,
            ReasonArg::PlansFallback => efl_types::PipelineReason::PlansFallback,
            ReasonArg::DashboardBootstrap => efl_types::PipelineReason::DashboardBootstrap,
        }
    }
}
