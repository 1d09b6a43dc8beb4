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

//! The per-home pipeline orchestrator (spec §4.10), composing `efl-engine`'s pure stages over
//! `efl-store` repositories and `efl-adapters` collaborators. Grounded on
//! `fluxion-upgrader::upgrader::Upgrader`'s struct-of-collaborators shape and its private
//! per-step async methods; bounded EFL fan-out is a `tokio::sync::Semaphore` sized to
//! `fanout_limit` (spec §5.1).

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use efl_adapters::{BuildBucketsRequest, EflFetch, OffersProvider, TdspRatesProvider, UsageBucketsProvider};
use efl_engine::computability::{self, ComputabilityOptions};
use efl_engine::draft_parser::DraftParser;
use efl_engine::estimator::{self, EstimatorInputs};
use efl_engine::template_mapping::{TemplateMappingInput, run_template_mapping};
use efl_hashing::{hash_canonical, sha256_hex};
use efl_store::{
    Database, EstimateCacheRepo, HouseAddressRepo, MaterializedEstimateRepo, OfferRatePlanMapRepo, OfferRepo,
    PipelineJobRepo, RatePlanRepo, ReviewQueueRepo,
};
use efl_types::{
    CachedOffer, ComputabilityStatus, EngineConfig, Estimate, EstimateCacheEntry, EstimateInputs, EstimateMode,
    EstimateStatus, HouseAddress, MaterializedEstimate, Offer, OfferRatePlanMap, PipelineJob, PipelineJobCounts,
    PipelineJobStatus, PipelineReason, RatePlan, Result,
};

use crate::gating::{self, GateDecision};
use crate::review_policy;

const DEFAULT_COOLDOWN_SECS: i64 = 60;
const BOUNDED_COOLDOWN_SECS: i64 = 15;

#[derive(Debug, Clone)]
pub struct HomeRunRequest {
    pub home_id: String,
    pub reason: PipelineReason,
    pub usage_window_end: NaiveDate,
}

/// Per-home pipeline orchestrator. Owns one repository handle per `efl-store` table and one
/// collaborator per `efl-adapters` trait; all pure computation is delegated to `efl-engine`.
pub struct Orchestrator {
    house_address_repo: HouseAddressRepo,
    offer_repo: OfferRepo,
    rate_plan_repo: RatePlanRepo,
    offer_rate_plan_map_repo: OfferRatePlanMapRepo,
    estimate_cache_repo: EstimateCacheRepo,
    materialized_estimate_repo: MaterializedEstimateRepo,
    pipeline_job_repo: PipelineJobRepo,
    review_queue_repo: ReviewQueueRepo,
    efl_fetch: Arc<dyn EflFetch>,
    offers: Arc<dyn OffersProvider>,
    tdsp_rates: Arc<dyn TdspRatesProvider>,
    usage_buckets: Arc<dyn UsageBucketsProvider>,
    draft_parser: Arc<dyn DraftParser + Send + Sync>,
    config: EngineConfig,
}

impl Orchestrator {
    pub fn new(
        db: Arc<Database>,
        efl_fetch: Arc<dyn EflFetch>,
        offers: Arc<dyn OffersProvider>,
        tdsp_rates: Arc<dyn TdspRatesProvider>,
        usage_buckets: Arc<dyn UsageBucketsProvider>,
        draft_parser: Arc<dyn DraftParser + Send + Sync>,
        config: EngineConfig,
    ) -> Self {
        Self {
            house_address_repo: HouseAddressRepo::new(db.clone()),
            offer_repo: OfferRepo::new(db.clone()),
            rate_plan_repo: RatePlanRepo::new(db.clone()),
            offer_rate_plan_map_repo: OfferRatePlanMapRepo::new(db.clone()),
            estimate_cache_repo: EstimateCacheRepo::new(db.clone()),
            materialized_estimate_repo: MaterializedEstimateRepo::new(db.clone()),
            pipeline_job_repo: PipelineJobRepo::new(db.clone()),
            review_queue_repo: ReviewQueueRepo::new(db),
            efl_fetch,
            offers,
            tdsp_rates,
            usage_buckets,
            draft_parser,
            config,
        }
    }

    /// Runs the spec §4.10 six-step flow for one home. Infra failures (repository I/O) surface
    /// as `Err`; domain-level aborts (gating skip, missing address, offers fetch failure, no
    /// usage yet) are recorded into the returned job's own status and reason fields instead, per
    /// spec §7's "no synchronous error surfaces except via the structured status".
    pub async fn run_home_pipeline(&self, request: &HomeRunRequest) -> Result<PipelineJob> {
        let now = Utc::now();
        let prior = self.pipeline_job_repo.latest_for_home(&request.home_id)?;

        match gating::gate(prior.as_ref(), request.reason, now, &self.config) {
            GateDecision::Proceed => {}
            decision => {
                tracing::info!(home_id = %request.home_id, ?decision, "skipping pipeline run");
                return Ok(prior.expect("gate only returns a non-Proceed decision when a prior job exists"));
            }
        }

        let run_id = sha256_hex(format!("{}|{}|{:?}", request.home_id, now.to_rfc3339(), request.reason).as_bytes())
            [..16]
            .to_string();

        let mut job = PipelineJob {
            home_id: request.home_id.clone(),
            run_id,
            status: PipelineJobStatus::Running,
            reason: request.reason,
            calc_version: self.config.engine_version.clone(),
            started_at: now,
            finished_at: None,
            cooldown_until: None,
            last_calc_window_end: prior.as_ref().and_then(|j| j.last_calc_window_end),
            counts: PipelineJobCounts::default(),
            last_error: None,
        };
        self.pipeline_job_repo.upsert(&job)?;

        let Some(address) = self.house_address_repo.get_by_home_id(&request.home_id)? else {
            return self.finish_error(&mut job, now, "no house address on file for home".to_string());
        };
        if let Err(e) = HouseAddressRepo::missing_address_fields(&address) {
            return self.finish_error(&mut job, now, e.to_string());
        }

        let offers = match self.offers.fetch_offers(&request.home_id).await {
            Ok(offers) => offers,
            Err(e) => return self.finish_error(&mut job, now, format!("offers fetch failed: {e}")),
        };
        job.counts.offers_considered = offers.len() as u32;
        for offer in &offers {
            self.offer_repo.upsert(&to_cached_offer(&request.home_id, offer, now))?;
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.clamped_time_budget_ms());

        let mapped_plans = self.map_templates(&offers, &mut job, deadline).await?;

        let required_keys: BTreeSet<String> =
            mapped_plans.iter().flat_map(|(_, plan)| plan.required_bucket_keys.clone()).collect();

        if required_keys.is_empty() {
            job.status = PipelineJobStatus::Done;
            job.finished_at = Some(now);
            job.cooldown_until = Some(now + chrono::Duration::seconds(DEFAULT_COOLDOWN_SECS));
            self.pipeline_job_repo.upsert(&job)?;
            return Ok(job);
        }

        let buckets = self
            .usage_buckets
            .build_buckets(&BuildBucketsRequest {
                home_id: request.home_id.clone(),
                source: "smart_meter".to_string(),
                window_end: request.usage_window_end,
                cutoff: None,
                required_bucket_keys: required_keys.into_iter().collect(),
                months_count: 12,
            })
            .await?;

        if buckets.year_months.is_empty() {
            job.status = PipelineJobStatus::Done;
            job.finished_at = Some(now);
            job.cooldown_until = Some(now + chrono::Duration::seconds(DEFAULT_COOLDOWN_SECS));
            self.pipeline_job_repo.upsert(&job)?;
            return Ok(job);
        }

        let mut any_estimate_succeeded = false;
        for (offer, plan) in mapped_plans.iter().take(self.config.max_estimate_plans) {
            if Instant::now() >= deadline {
                break;
            }
            if self.fill_estimate(&address, offer, plan, &buckets, now, &mut job).await? {
                any_estimate_succeeded = true;
            }
        }

        job.status = PipelineJobStatus::Done;
        job.finished_at = Some(now);
        if any_estimate_succeeded {
            job.last_calc_window_end =
                Some(request.usage_window_end.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());
        }
        let bounded = Instant::now() >= deadline;
        job.cooldown_until = Some(
            now + chrono::Duration::seconds(if bounded { BOUNDED_COOLDOWN_SECS } else { DEFAULT_COOLDOWN_SECS }),
        );
        self.pipeline_job_repo.upsert(&job)?;
        Ok(job)
    }

    fn finish_error(&self, job: &mut PipelineJob, now: DateTime<Utc>, message: String) -> Result<PipelineJob> {
        job.status = PipelineJobStatus::Error;
        job.finished_at = Some(now);
        job.last_error = Some(message);
        job.cooldown_until = Some(now + chrono::Duration::seconds(DEFAULT_COOLDOWN_SECS));
        self.pipeline_job_repo.upsert(job)?;
        Ok(job.clone())
    }

    /// Spec §4.10 step 3: map each unmapped (or mapped-but-empty) offer's EFL to a `RatePlan`
    /// template, bounded by `maxTemplateOffers` and the shared `timeBudgetMs` deadline. EFL
    /// fetches run concurrently under a `Semaphore` sized to `fanoutLimit`; the CPU-only
    /// normalize/solve/score pipeline then runs sequentially per offer.
    async fn map_templates(
        &self,
        offers: &[Offer],
        job: &mut PipelineJob,
        deadline: Instant,
    ) -> Result<Vec<(Offer, RatePlan)>> {
        let candidates: Vec<&Offer> = offers
            .iter()
            .filter(|o| o.efl_url.is_some())
            .filter(|o| self.needs_mapping(&o.id).unwrap_or(true))
            .take(self.config.max_template_offers)
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.config.fanout_limit));
        let mut fetches = JoinSet::new();
        for offer in &candidates {
            let url = offer.efl_url.clone().expect("filtered to Some above");
            let offer_id = offer.id.clone();
            let efl_fetch = self.efl_fetch.clone();
            let permit = semaphore.clone();
            fetches.spawn(async move {
                let _permit = permit.acquire_owned().await;
                (offer_id, efl_fetch.fetch_efl(&url).await)
            });
        }

        let mut fetched = std::collections::BTreeMap::new();
        while let Some(joined) = fetches.join_next().await {
            if let Ok((offer_id, result)) = joined {
                fetched.insert(offer_id, result);
            }
        }

        let mut mapped = Vec::new();
        for offer in candidates {
            if Instant::now() >= deadline {
                break;
            }
            let Some(fetch_result) = fetched.get(&offer.id) else { continue };
            let fetch_result = match fetch_result {
                Ok(r) => r,
                Err(e) => {
                    review_policy::enqueue_efl_parse_review(
                        &self.review_queue_repo,
                        &offer.id,
                        "",
                        "EFL_FETCH_FAILED",
                        e.to_string(),
                    )?;
                    continue;
                }
            };
            let Some(raw_text) = &fetch_result.raw_text else {
                review_policy::enqueue_efl_parse_review(
                    &self.review_queue_repo,
                    &offer.id,
                    "",
                    "EFL_PDF_TEXT_UNAVAILABLE",
                    "PDF text extraction is out of scope; only already-extracted text is accepted",
                )?;
                continue;
            };

            let efl_sha256 = sha256_hex(raw_text.as_bytes());
            let disclosed_points = offer.disclosed_table();
            let result = run_template_mapping(
                &TemplateMappingInput {
                    raw_text,
                    efl_sha256: &efl_sha256,
                    disclosed_points: &disclosed_points,
                    tolerance_cents_per_kwh: self.config.tolerance_cents_per_kwh,
                },
                self.draft_parser.as_ref(),
            );

            if !result.eligible_for_auto_persist() {
                review_policy::enqueue_efl_parse_review(
                    &self.review_queue_repo,
                    &offer.id,
                    &efl_sha256,
                    "TEMPLATE_MAPPING_BELOW_AUTO_PERSIST_THRESHOLD",
                    format!(
                        "validation_pass={} pass_strength={:?} has_identity={}",
                        result.validation.is_pass(),
                        result.pass_strength.level,
                        result.has_identity()
                    ),
                )?;
                continue;
            }

            let has_anchor = offer.disclosed_avg_price_1000_cents_per_kwh.is_some();
            let computability =
                computability::analyze(&result.rate_structure, has_anchor, &ComputabilityOptions::default());

            let plan = RatePlan {
                id: efl_sha256.clone(),
                efl_pdf_sha256: efl_sha256.clone(),
                efl_url: offer.efl_url.clone(),
                rate_structure: result.rate_structure,
                plan_calc_version: 1,
                plan_calc_status: plan_calc_status_str(computability.status).to_string(),
                plan_calc_reason_code: computability.reason_code,
                required_bucket_keys: computability.required_bucket_keys.clone(),
                supported_features: computability.supported_features.clone(),
                plan_calc_derived_at: Utc::now(),
            };
            self.rate_plan_repo.upsert(&plan)?;
            self.offer_rate_plan_map_repo.upsert(&OfferRatePlanMap {
                offer_id: offer.id.clone(),
                rate_plan_id: plan.id.clone(),
                last_linked_at: Utc::now(),
                linked_by: "orchestrator".to_string(),
            })?;
            job.counts.templates_mapped += 1;

            if computability.is_quarantine_worthy() {
                review_policy::auto_enqueue_quarantine(&self.review_queue_repo, &offer.id, &plan.id, &computability)?;
                job.counts.quarantined += 1;
            }

            mapped.push((offer.clone(), plan));
        }

        Ok(mapped)
    }

    fn needs_mapping(&self, offer_id: &str) -> Result<bool> {
        let Some(link) = self.offer_rate_plan_map_repo.get_by_offer_id(offer_id)? else { return Ok(true) };
        let Some(plan) = self.rate_plan_repo.get_by_id(&link.rate_plan_id)? else { return Ok(true) };
        Ok(rate_structure_is_empty(&plan.rate_structure))
    }

    /// Spec §4.10 step 5: re-derive computability, skip/quarantine transient vs. structural
    /// gaps, compute `inputsSha256`, short-circuit on cache hit, else run the estimator and
    /// write both the content-addressed cache and the dashboard materialization. Returns
    /// whether an OK/APPROXIMATE estimate was produced.
    async fn fill_estimate(
        &self,
        address: &HouseAddress,
        offer: &Offer,
        plan: &RatePlan,
        buckets: &efl_adapters::BuildBucketsResult,
        now: DateTime<Utc>,
        job: &mut PipelineJob,
    ) -> Result<bool> {
        let Some(tdsp_slug) = &address.tdsp_slug else { return Ok(false) };
        let Some(tdsp_rates) = self.tdsp_rates.get_tdsp_rates(tdsp_slug, now.date_naive()).await? else {
            return Ok(false);
        };

        let has_anchor = offer.disclosed_avg_price_1000_cents_per_kwh.is_some();
        let computability = computability::analyze(&plan.rate_structure, has_anchor, &ComputabilityOptions::default());

        if !computability.is_computable() {
            if computability.is_quarantine_worthy() {
                review_policy::auto_enqueue_quarantine(&self.review_queue_repo, &offer.id, &plan.id, &computability)?;
                job.counts.quarantined += 1;
            }
            return Ok(false);
        }

        let estimate_mode = if plan.plan_calc_reason_code == Some(efl_types::ReasonCode::IndexedApproximateOk) {
            EstimateMode::IndexedEflAnchorApprox
        } else {
            EstimateMode::Default
        };

        let months_count = 12u32;
        let annual_kwh_rounded = (buckets.annual_kwh * 1e6).round() / 1e6;
        let rate_structure_sha = hash_canonical(&plan.rate_structure)?;
        let inputs = EstimateInputs {
            engine_version: self.config.engine_version.clone(),
            months_count,
            annual_kwh: annual_kwh_rounded,
            tdsp: tdsp_slug.clone(),
            rate_structure_sha,
            year_months: buckets.year_months.clone(),
            bucket_keys: computability.required_bucket_keys.clone(),
            usage_buckets_by_month: buckets.usage_buckets_by_month.by_year_month.clone(),
        };
        let inputs_sha256 = hash_canonical(&inputs)?;

        let estimate = match self.estimate_cache_repo.get(&address.id, &plan.id, &inputs_sha256, months_count)? {
            Some(cached) => {
                job.counts.estimates_already_cached += 1;
                cached.payload
            }
            None => {
                let estimate = estimator::estimate(&EstimatorInputs {
                    annual_kwh: annual_kwh_rounded,
                    months_count,
                    tdsp_rates,
                    rate_structure: &plan.rate_structure,
                    usage_buckets_by_month: &buckets.usage_buckets_by_month,
                    estimate_mode,
                    efl_disclosed_1000kwh_cents_per_kwh: offer.disclosed_avg_price_1000_cents_per_kwh,
                });
                self.estimate_cache_repo.upsert(&EstimateCacheEntry {
                    house_address_id: address.id.clone(),
                    rate_plan_id: plan.id.clone(),
                    inputs_sha256,
                    months_count,
                    payload: estimate.clone(),
                    computed_at: now,
                })?;
                job.counts.estimates_computed += 1;
                estimate
            }
        };

        self.materialized_estimate_repo.upsert(&MaterializedEstimate {
            house_address_id: address.id.clone(),
            rate_plan_id: plan.id.clone(),
            payload: estimate.clone(),
            computed_at: now,
            expires_at: Some(now + chrono::Duration::days(1)),
        })?;

        review_policy::auto_resolve_quarantine(&self.review_queue_repo, &offer.id, estimate.status)?;

        Ok(matches!(estimate.status, EstimateStatus::Ok | EstimateStatus::Approximate))
    }
}

fn to_cached_offer(home_id: &str, offer: &Offer, fetched_at: DateTime<Utc>) -> CachedOffer {
    CachedOffer {
        id: offer.id.clone(),
        home_id: home_id.to_string(),
        supplier: offer.supplier.clone(),
        plan_name: offer.plan_name.clone(),
        term_months: Some(offer.term_months),
        efl_url: offer.efl_url.clone(),
        disclosed_prices_cents_per_kwh: offer.disclosed_table(),
        tdsp: Some(offer.tdsp_territory.clone()),
        renewable_percent: offer.renewable_percent,
        fetched_at,
    }
}

fn rate_structure_is_empty(structure: &efl_types::RateStructure) -> bool {
    structure.energy_rate_cents.is_none()
        && structure.usage_tiers.is_empty()
        && structure.time_of_use_periods.is_empty()
}

fn plan_calc_status_str(status: ComputabilityStatus) -> &'static str {
    match status {
        ComputabilityStatus::Computable => "COMPUTABLE",
        ComputabilityStatus::NotComputable => "NOT_COMPUTABLE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use efl_adapters::{StaticEflFetch, StaticOffersProvider, StaticTdspRatesProvider, StaticUsageBucketsProvider};
    use efl_engine::draft_parser::NullDraftParser;
    use efl_types::{MonthlyUsageBuckets, TdspRates};
    use std::collections::BTreeMap;

    fn sample_offer(id: &str, efl_url: &str) -> Offer {
        Offer {
            id: id.to_string(),
            supplier: "Acme Energy".into(),
            plan_name: "Saver 12".into(),
            term_months: 12,
            efl_url: Some(efl_url.to_string()),
            disclosed_avg_price_500_cents_per_kwh: Some(11.0),
            disclosed_avg_price_1000_cents_per_kwh: Some(11.0),
            disclosed_avg_price_2000_cents_per_kwh: Some(11.0),
            tdsp_territory: "centerpoint".into(),
            renewable_percent: Some(10.0),
        }
    }

    fn sample_address() -> HouseAddress {
        HouseAddress {
            id: "ha-1".into(),
            home_id: "home-1".into(),
            street: Some("1 Main St".into()),
            city: Some("Houston".into()),
            state: Some("TX".into()),
            zip: Some("77002".into()),
            tdsp_slug: Some("centerpoint".into()),
            is_renter: false,
        }
    }

    fn sample_buckets() -> MonthlyUsageBuckets {
        let mut by_year_month = BTreeMap::new();
        for m in 1..=12u8 {
            let mut bucket = BTreeMap::new();
            bucket.insert(efl_types::BUCKET_KEY_ALL_TOTAL.to_string(), 1000.0);
            by_year_month.insert(format!("2025-{m:02}"), bucket);
        }
        MonthlyUsageBuckets { by_year_month }
    }

    fn build_orchestrator(efl_url: &str, raw_text: &str) -> Orchestrator {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.as_ref();
        let mut offers_provider = StaticOffersProvider::default();
        offers_provider.by_home_id.insert("home-1".into(), vec![sample_offer("offer-1", efl_url)]);

        let mut usage_provider = StaticUsageBucketsProvider::new();
        usage_provider.insert("home-1", sample_buckets());

        let tdsp_provider = StaticTdspRatesProvider::new();
        tdsp_provider.insert(
            "centerpoint",
            TdspRates {
                per_kwh_delivery_charge_cents: 3.87,
                monthly_customer_charge_dollars: 4.39,
                effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            },
        );

        let orchestrator = Orchestrator::new(
            db.clone(),
            Arc::new(StaticEflFetch::with_text(efl_url, raw_text)),
            Arc::new(offers_provider),
            Arc::new(tdsp_provider),
            Arc::new(usage_provider),
            Arc::new(NullDraftParser),
            EngineConfig::default(),
        );
        orchestrator.house_address_repo.upsert(&sample_address()).unwrap();
        orchestrator
    }

    fn flat_rate_efl() -> String {
        format!(
            "PUCT Certificate #10234\nVersion #: 1.0\nEnergy Charge 11.0\u{a2} per kWh\n{}",
            "padding line for length ".repeat(10)
        )
    }

    #[tokio::test]
    async fn test_full_run_maps_template_and_computes_estimate() {
        let orchestrator = build_orchestrator("https://example.com/efl.pdf", &flat_rate_efl());
        let request = HomeRunRequest {
            home_id: "home-1".into(),
            reason: PipelineReason::DashboardBootstrap,
            usage_window_end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        };

        let job = orchestrator.run_home_pipeline(&request).await.unwrap();
        assert_eq!(job.status, PipelineJobStatus::Done);
        assert_eq!(job.counts.templates_mapped, 1);
        assert_eq!(job.counts.estimates_computed, 1);
        assert!(job.last_calc_window_end.is_some());

        let second = orchestrator
            .run_home_pipeline(&HomeRunRequest { reason: PipelineReason::PlansFallback, ..request })
            .await
            .unwrap();
        assert_eq!(second.counts.estimates_already_cached, 1);
        assert_eq!(second.counts.estimates_computed, 0);
    }

    #[tokio::test]
    async fn test_missing_address_aborts_gracefully() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let orchestrator = Orchestrator::new(
            db,
            Arc::new(StaticEflFetch::default()),
            Arc::new(StaticOffersProvider::default()),
            Arc::new(StaticTdspRatesProvider::new()),
            Arc::new(StaticUsageBucketsProvider::new()),
            Arc::new(NullDraftParser),
            EngineConfig::default(),
        );

        let request = HomeRunRequest {
            home_id: "home-missing".into(),
            reason: PipelineReason::DashboardBootstrap,
            usage_window_end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        };
        let job = orchestrator.run_home_pipeline(&request).await.unwrap();
        assert_eq!(job.status, PipelineJobStatus::Error);
        assert!(job.last_error.is_some());
    }

    #[tokio::test]
    async fn test_gate_skips_job_still_running() {
        let orchestrator = build_orchestrator("https://example.com/efl.pdf", &flat_rate_efl());
        let request = HomeRunRequest {
            home_id: "home-1".into(),
            reason: PipelineReason::DashboardBootstrap,
            usage_window_end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        };

        let running = PipelineJob {
            home_id: "home-1".into(),
            run_id: "stuck-run".into(),
            status: PipelineJobStatus::Running,
            reason: PipelineReason::DashboardBootstrap,
            calc_version: "1".into(),
            started_at: Utc::now(),
            finished_at: None,
            cooldown_until: None,
            last_calc_window_end: None,
            counts: PipelineJobCounts::default(),
            last_error: None,
        };
        orchestrator.pipeline_job_repo.upsert(&running).unwrap();

        let job = orchestrator.run_home_pipeline(&request).await.unwrap();
        assert_eq!(job.run_id, "stuck-run");
        assert_eq!(job.counts.templates_mapped, 0);
    }
}
