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

//! Offers fetch (spec §4.10: "Fetch offers for the home (with 15-minute TTL cache; live call
//! has a 12-second timeout). If live and cache both fail, abort gracefully.").

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use efl_types::{EngineError, Offer, Result};
use serde::Deserialize;

const USER_AGENT: &str = "efl-pricing-engine/0.1";

#[async_trait]
pub trait OffersProvider: Send + Sync {
    async fn fetch_offers(&self, home_id: &str) -> Result<Vec<Offer>>;
}

/// Live implementation against a WattBuy-shaped offers API, grounded on
/// `fluxion-upgrader::release_checker`'s user-agent/timeout client and JSON decode shape.
pub struct HttpOffersProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOffersProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::OffersFetch(format!("failed to build offers client: {e}")))?;
        Ok(Self { client, base_url: base_url.into() })
    }
}

#[derive(Debug, Deserialize)]
struct OffersResponse {
    offers: Vec<Offer>,
}

#[async_trait]
impl OffersProvider for HttpOffersProvider {
    async fn fetch_offers(&self, home_id: &str) -> Result<Vec<Offer>> {
        let url = format!("{}/homes/{home_id}/offers", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineError::OffersFetch(format!("offers request failed: {e}")))?;

        if response.status().is_client_error() || response.status().is_server_error() {
            let status = response.status();
            return Err(EngineError::OffersFetch(format!("offers API returned {status}")));
        }

        let parsed: OffersResponse = response
            .json()
            .await
            .map_err(|e| EngineError::OffersFetch(format!("failed to parse offers response: {e}")))?;
        Ok(parsed.offers)
    }
}

/// Deterministic stub keyed by home id.
#[derive(Debug, Clone, Default)]
pub struct StaticOffersProvider {
    pub by_home_id: BTreeMap<String, Vec<Offer>>,
}

#[async_trait]
impl OffersProvider for StaticOffersProvider {
    async fn fetch_offers(&self, home_id: &str) -> Result<Vec<Offer>> {
        Ok(self.by_home_id.get(home_id).cloned().unwrap_or_default())
    }
}

struct CacheEntry {
    fetched_at: Instant,
    offers: Vec<Offer>,
}

/// Wraps any `OffersProvider` with a 15-minute TTL cache (spec §4.10, §5). A live-fetch failure
/// falls back to a stale cache entry rather than aborting the whole orchestrator step.
pub struct CachedOffersProvider<P: OffersProvider> {
    inner: P,
    ttl: Duration,
    cache: Mutex<BTreeMap<String, CacheEntry>>,
}

impl<P: OffersProvider> CachedOffersProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self { inner, ttl, cache: Mutex::new(BTreeMap::new()) }
    }

    fn fresh_cached(&self, home_id: &str) -> Option<Vec<Offer>> {
        let cache = self.cache.lock().unwrap();
        let entry = cache.get(home_id)?;
        if entry.fetched_at.elapsed() < self.ttl { Some(entry.offers.clone()) } else { None }
    }

    fn stale_cached(&self, home_id: &str) -> Option<Vec<Offer>> {
        self.cache.lock().unwrap().get(home_id).map(|e| e.offers.clone())
    }
}

#[async_trait]
impl<P: OffersProvider> OffersProvider for CachedOffersProvider<P> {
    async fn fetch_offers(&self, home_id: &str) -> Result<Vec<Offer>> {
        if let Some(cached) = self.fresh_cached(home_id) {
            return Ok(cached);
        }

        match self.inner.fetch_offers(home_id).await {
            Ok(offers) => {
                self.cache
                    .lock()
                    .unwrap()
                    .insert(home_id.to_string(), CacheEntry { fetched_at: Instant::now(), offers: offers.clone() });
                Ok(offers)
            }
            Err(live_err) => {
                if let Some(stale) = self.stale_cached(home_id) {
                    tracing::warn!("live offers fetch failed for {home_id}, serving stale cache: {live_err}");
                    Ok(stale)
                } else {
                    Err(live_err)
                }
            }
        }
    }
}
