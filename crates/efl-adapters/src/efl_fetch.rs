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

//! EFL document fetch (spec §6): accepts direct PDFs or landing pages; redirect and PDF-magic
//! sniffing are handled upstream of this trait, which only needs the final bytes/text.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use efl_types::{EngineError, Result};

const USER_AGENT: &str = "efl-pricing-engine/0.1";
const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Clone)]
pub struct EflFetchResult {
    pub raw_text: Option<String>,
    pub pdf_bytes: Option<Vec<u8>>,
    pub pdf_url: String,
    pub content_type: String,
}

#[async_trait]
pub trait EflFetch: Send + Sync {
    async fn fetch_efl(&self, url: &str) -> Result<EflFetchResult>;
}

/// Live implementation: one `reqwest::Client` with a configurable per-fetch timeout (spec §5:
/// PDF fetch has a 20s deadline), grounded on `fluxion-upgrader::release_checker`'s
/// user-agent/timeout client shape.
pub struct HttpEflFetch {
    client: reqwest::Client,
}

impl HttpEflFetch {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::AiTransport(format!("failed to build EFL fetch client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EflFetch for HttpEflFetch {
    async fn fetch_efl(&self, url: &str) -> Result<EflFetchResult> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EngineError::AiTransport(format!("EFL fetch request failed: {e}")))?;

        let content_type =
            response.headers().get("content-type").and_then(|v| v.to_str().ok()).unwrap_or("").to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| EngineError::AiTransport(format!("EFL fetch body read failed: {e}")))?;

        if bytes.starts_with(PDF_MAGIC) || content_type.contains("pdf") {
            Ok(EflFetchResult {
                raw_text: None,
                pdf_bytes: Some(bytes.to_vec()),
                pdf_url: url.to_string(),
                content_type,
            })
        } else {
            let raw_text = String::from_utf8_lossy(&bytes).into_owned();
            Ok(EflFetchResult { raw_text: Some(raw_text), pdf_bytes: None, pdf_url: url.to_string(), content_type })
        }
    }
}

/// Deterministic stub keyed by URL, used in orchestrator and integration tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEflFetch {
    pub by_url: BTreeMap<String, EflFetchResult>,
}

impl StaticEflFetch {
    pub fn with_text(url: impl Into<String>, raw_text: impl Into<String>) -> Self {
        let url = url.into();
        let mut by_url = BTreeMap::new();
        by_url.insert(
            url.clone(),
            EflFetchResult { raw_text: Some(raw_text.into()), pdf_bytes: None, pdf_url: url, content_type: "text/plain".into() },
        );
        Self { by_url }
    }
}

#[async_trait]
impl EflFetch for StaticEflFetch {
    async fn fetch_efl(&self, url: &str) -> Result<EflFetchResult> {
        self.by_url
            .get(url)
            .cloned()
            .ok_or_else(|| EngineError::AiTransport(format!("no stubbed EFL for {url}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_fetch_returns_stubbed_text() {
        let fetcher = StaticEflFetch::with_text("https://example.com/efl.pdf", "Average Monthly Use 500 kWh");
        let result = fetcher.fetch_efl("https://example.com/efl.pdf").await.unwrap();
        assert_eq!(result.raw_text.unwrap(), "Average Monthly Use 500 kWh");
    }

    #[tokio::test]
    async fn test_static_fetch_missing_url_errors() {
        let fetcher = StaticEflFetch::default();
        assert!(fetcher.fetch_efl("https://example.com/missing.pdf").await.is_err());
    }

    #[tokio::test]
    async fn test_http_fetch_detects_pdf_by_magic_bytes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/efl.pdf")
            .with_status(200)
            .with_header("content-type", "application/octet-stream")
            .with_body(b"%PDF-1.4 fake pdf body".to_vec())
            .create_async()
            .await;

        let fetcher = HttpEflFetch::new(Duration::from_secs(5)).unwrap();
        let url = format!("{}/efl.pdf", server.url());
        let result = fetcher.fetch_efl(&url).await.unwrap();
        assert!(result.pdf_bytes.is_some());
        assert!(result.raw_text.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_fetch_detects_plain_text_by_content_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/efl.html")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("Energy Charge 11.0 cents per kWh")
            .create_async()
            .await;

        let fetcher = HttpEflFetch::new(Duration::from_secs(5)).unwrap();
        let url = format!("{}/efl.html", server.url());
        let result = fetcher.fetch_efl(&url).await.unwrap();
        assert!(result.raw_text.unwrap().contains("Energy Charge"));
        mock.assert_async().await;
    }
}
