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

//! Subcommand implementations. Each function takes the parsed args plus the loaded
//! `EngineConfig` and returns `anyhow::Result<()>`, following `fluxion-main`'s
//! `.context(...)`-at-call-site error handling.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{Table, presets::UTF8_FULL};

use efl_adapters::{
    CachedOffersProvider, EflFetch, HttpEflFetch, HttpOffersProvider, OffersProvider, StaticOffersProvider,
    StaticTdspRatesProvider, StaticUsageBucketsProvider, TdspRatesProvider, UsageBucketsProvider,
};
use efl_engine::draft_parser::NullDraftParser;
use efl_engine::template_mapping::{TemplateMappingInput, run_template_mapping};
use efl_orchestrator::{HomeRunRequest, Orchestrator};
use efl_store::{Database, PipelineJobRepo};
use efl_types::{EngineConfig, MonthlyUsageBuckets, TdspRates};

use super::args::{ParseArgs, ReplayJobArgs, RunHomeArgs};

pub fn run_parse(args: &ParseArgs, config: &EngineConfig) -> Result<()> {
    let raw_text = std::fs::read_to_string(&args.efl_text)
        .with_context(|| format!("reading EFL text from {}", args.efl_text.display()))?;
    let efl_sha256 = efl_hashing::sha256_hex(raw_text.as_bytes());

    let disclosed_points: Vec<(f64, f64)> = [(500.0, args.p500), (1000.0, args.p1000), (2000.0, args.p2000)]
        .into_iter()
        .filter_map(|(kwh, price)| price.map(|p| (kwh, p)))
        .collect();

    let result = run_template_mapping(
        &TemplateMappingInput {
            raw_text: &raw_text,
            efl_sha256: &efl_sha256,
            disclosed_points: &disclosed_points,
            tolerance_cents_per_kwh: config.tolerance_cents_per_kwh,
        },
        &NullDraftParser,
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["field", "value"]);
    table.add_row(vec!["efl_sha256".to_string(), efl_sha256]);
    table.add_row(vec!["rate_type".to_string(), format!("{:?}", result.rate_structure.rate_type)]);
    table.add_row(vec!["validation_status".to_string(), format!("{:?}", result.validation.status)]);
    table.add_row(vec!["solve_mode".to_string(), format!("{:?}", result.solve_mode)]);
    table.add_row(vec!["pass_strength".to_string(), format!("{:?}", result.pass_strength.level)]);
    table.add_row(vec!["has_identity".to_string(), result.has_identity().to_string()]);
    table.add_row(vec!["eligible_for_auto_persist".to_string(), result.eligible_for_auto_persist().to_string()]);
    if !result.solver_applied.is_empty() {
        table.add_row(vec!["solver_applied".to_string(), result.solver_applied.join(", ")]);
    }
    if !result.draft_warnings.is_empty() {
        table.add_row(vec!["draft_warnings".to_string(), result.draft_warnings.join("; ")]);
    }

    println!("{table}");
    Ok(())
}

pub async fn run_run_home(args: &RunHomeArgs, config: &EngineConfig) -> Result<()> {
    let usage_window_end = NaiveDate::parse_from_str(&args.usage_window_end, "%Y-%m-%d")
        .with_context(|| format!("parsing --usage-window-end {}", args.usage_window_end))?;

    let db_path = args.db.to_str().with_context(|| format!("non-utf8 db path {}", args.db.display()))?;
    let db = Arc::new(Database::open(db_path).with_context(|| format!("opening store at {}", args.db.display()))?);

    let efl_fetch: Arc<dyn EflFetch> =
        Arc::new(HttpEflFetch::new(Duration::from_secs(config.efl_fetch_timeout_secs))?);

    let offers: Arc<dyn OffersProvider> = match &args.offers_api_base_url {
        Some(base_url) => {
            let live = HttpOffersProvider::new(base_url.clone(), Duration::from_secs(config.offers_live_timeout_secs))?;
            Arc::new(CachedOffersProvider::new(live, Duration::from_secs(config.offers_cache_ttl_secs)))
        }
        None => {
            tracing::warn!("no --offers-api-base-url given, running with no offers");
            Arc::new(StaticOffersProvider::default())
        }
    };

    let tdsp_rates: Arc<dyn TdspRatesProvider> = Arc::new(load_tdsp_rates(args.tdsp_rates_file.as_deref())?);
    let usage_buckets: Arc<dyn UsageBucketsProvider> = Arc::new(load_usage_buckets(args.usage_buckets_file.as_deref())?);

    let orchestrator = Orchestrator::new(
        db,
        efl_fetch,
        offers,
        tdsp_rates,
        usage_buckets,
        Arc::new(NullDraftParser),
        config.clone(),
    );

    let job = orchestrator
        .run_home_pipeline(&HomeRunRequest { home_id: args.home_id.clone(), reason: args.reason.into(), usage_window_end })
        .await
        .context("running per-home pipeline")?;

    print_job(&job);
    Ok(())
}

pub fn run_replay_job(args: &ReplayJobArgs) -> Result<()> {
    let db_path = args.db.to_str().with_context(|| format!("non-utf8 db path {}", args.db.display()))?;
    let db = Arc::new(Database::open(db_path).with_context(|| format!("opening store at {}", args.db.display()))?);
    let repo = PipelineJobRepo::new(db);
    match repo.latest_for_home(&args.home_id).context("loading latest pipeline job")? {
        Some(job) => print_job(&job),
        None => println!("no pipeline job recorded for home {}", args.home_id),
    }
    Ok(())
}

fn load_tdsp_rates(path: Option<&Path>) -> Result<StaticTdspRatesProvider> {
    let provider = StaticTdspRatesProvider::new();
    let Some(path) = path else { return Ok(provider) };
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let by_slug: BTreeMap<String, Vec<TdspRates>> =
        serde_json::from_str(&content).with_context(|| format!("parsing {} as {{slug: [TdspRates]}}", path.display()))?;
    for (slug, rates) in by_slug {
        for rate in rates {
            provider.insert(slug.clone(), rate);
        }
    }
    Ok(provider)
}

fn load_usage_buckets(path: Option<&Path>) -> Result<StaticUsageBucketsProvider> {
    let mut provider = StaticUsageBucketsProvider::new();
    let Some(path) = path else { return Ok(provider) };
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let by_home_id: BTreeMap<String, MonthlyUsageBuckets> = serde_json::from_str(&content)
        .with_context(|| format!("parsing {} as {{homeId: MonthlyUsageBuckets}}", path.display()))?;
    for (home_id, buckets) in by_home_id {
        provider.insert(home_id, buckets);
    }
    Ok(provider)
}

fn print_job(job: &efl_types::PipelineJob) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["field", "value"]);
    table.add_row(vec!["home_id".to_string(), job.home_id.clone()]);
    table.add_row(vec!["run_id".to_string(), job.run_id.clone()]);
    table.add_row(vec!["status".to_string(), format!("{:?}", job.status)]);
    table.add_row(vec!["reason".to_string(), format!("{:?}", job.reason)]);
    table.add_row(vec!["started_at".to_string(), job.started_at.to_rfc3339()]);
    table.add_row(vec!["finished_at".to_string(), job.finished_at.map(|t| t.to_rfc3339()).unwrap_or_default()]);
    table.add_row(vec![
        "last_calc_window_end".to_string(),
        job.last_calc_window_end.map(|t| t.to_rfc3339()).unwrap_or_default(),
    ]);
    table.add_row(vec!["offers_considered".to_string(), job.counts.offers_considered.to_string()]);
    table.add_row(vec!["templates_mapped".to_string(), job.counts.templates_mapped.to_string()]);
    table.add_row(vec!["estimates_computed".to_string(), job.counts.estimates_computed.to_string()]);
    table.add_row(vec!["estimates_already_cached".to_string(), job.counts.estimates_already_cached.to_string()]);
    table.add_row(vec!["quarantined".to_string(), job.counts.quarantined.to_string()]);
    if let Some(err) = &job.last_error {
        table.add_row(vec!["last_error".to_string(), err.clone()]);
    }
    println!("{table}");
}
