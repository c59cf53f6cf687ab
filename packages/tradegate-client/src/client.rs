//! Tradegate backend HTTP client.

use std::future::Future;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use tradegate_core::{AnalysisRecord, IndicatorSnapshot, TradeProposal, Verdict};

use crate::config::ClientConfig;
use crate::wire::{
    normalize_market_state, BackendRecord, Envelope, EvaluateRequest, RawAnalysis,
    RawMarketState, RemoteStrategy, StrategyList, SymbolInfo,
};

/// What the async orchestrator needs from a backend.
pub trait AnalysisBackend {
    /// Indicator snapshot for an already formatted symbol.
    fn market_state(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> impl Future<Output = Result<IndicatorSnapshot>> + Send;

    /// External verdict on a proposal.
    fn verdict(
        &self,
        proposal: &TradeProposal,
        snapshot: &IndicatorSnapshot,
    ) -> impl Future<Output = Result<Verdict>> + Send;

    /// Latest stored analyses, newest first.
    fn latest_records(&self, limit: usize)
        -> impl Future<Output = Result<Vec<AnalysisRecord>>> + Send;
}

/// HTTP client for the Tradegate analysis backend
#[derive(Debug, Clone)]
pub struct TradeGateClient {
    base_url: String,
    client: Client,
}

impl TradeGateClient {
    /// Create a new client with the given base URL and no request timeout
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a client whose requests time out per the config
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Internal HTTP Methods
    // ========================================================================

    /// Make a GET request and return the response envelope
    async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<Envelope<T>> {
        let response = self.client.get(self.url(path)).query(query).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Request failed: {} {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        Ok(response.json().await?)
    }

    /// Make a POST request and unwrap the response envelope
    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.client.post(self.url(path)).json(body).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Request failed: {} {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        let envelope: Envelope<T> = response.json().await?;
        envelope.into_data()
    }

    // ========================================================================
    // Market API
    // ========================================================================

    /// Fetch and normalize the market state for a symbol
    pub async fn fetch_market_state(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<IndicatorSnapshot> {
        tracing::debug!(symbol, timeframe, "Fetching market state");
        let envelope: Envelope<RawMarketState> = self
            .get("/market/state", &[("symbol", symbol), ("timeframe", timeframe)])
            .await?;
        normalize_market_state(envelope.into_optional()?)
    }

    // ========================================================================
    // Analysis API
    // ========================================================================

    /// Ask the backend to evaluate a proposal
    pub async fn evaluate(
        &self,
        proposal: &TradeProposal,
        snapshot: &IndicatorSnapshot,
    ) -> Result<Verdict> {
        let body = EvaluateRequest {
            config: proposal,
            market_state: snapshot,
        };
        let raw: RawAnalysis = self.post("/analysis/evaluate", &body).await?;
        raw.into_verdict()
    }

    /// List the latest stored analyses
    pub async fn fetch_latest_records(&self, limit: usize) -> Result<Vec<AnalysisRecord>> {
        let envelope: Envelope<Vec<BackendRecord>> = self
            .get("/analysis/records/latest", &[("limit", limit)])
            .await?;
        envelope
            .into_data()?
            .into_iter()
            .map(BackendRecord::into_record)
            .collect()
    }

    // ========================================================================
    // Strategy API
    // ========================================================================

    /// List active strategies configured on the backend
    pub async fn list_strategies(&self) -> Result<Vec<RemoteStrategy>> {
        let envelope: Envelope<StrategyList> = self
            .get("/strategy/list", &[("active_only", true)])
            .await?;
        Ok(envelope.into_data()?.strategies)
    }

    // ========================================================================
    // Symbol API
    // ========================================================================

    /// Most traded symbols on an exchange
    pub async fn popular_symbols(&self, exchange: &str, limit: usize) -> Result<Vec<SymbolInfo>> {
        let envelope: Envelope<Vec<SymbolInfo>> = self
            .get(
                "/symbol/popular",
                &[("limit", limit.to_string()), ("exchange", exchange.to_string())],
            )
            .await?;
        envelope.into_data()
    }

    /// Symbols matching a search query; a blank query matches nothing
    pub async fn search_symbols(&self, query: &str, limit: usize) -> Result<Vec<SymbolInfo>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let envelope: Envelope<Vec<SymbolInfo>> = self
            .get(
                "/symbol/search",
                &[("q", query.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        envelope.into_data()
    }
}

impl AnalysisBackend for TradeGateClient {
    fn market_state(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> impl Future<Output = Result<IndicatorSnapshot>> + Send {
        self.fetch_market_state(symbol, timeframe)
    }

    fn verdict(
        &self,
        proposal: &TradeProposal,
        snapshot: &IndicatorSnapshot,
    ) -> impl Future<Output = Result<Verdict>> + Send {
        self.evaluate(proposal, snapshot)
    }

    fn latest_records(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<AnalysisRecord>>> + Send {
        self.fetch_latest_records(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = TradeGateClient::new("http://localhost:8000/api/");
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("/market/state"), "http://localhost:8000/api/market/state");
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig {
            base_url: "http://backend.test/api".to_string(),
            timeout_secs: 5,
        };
        let client = TradeGateClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://backend.test/api");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        // Port 9 (discard) on localhost is not an HTTP server
        let client = TradeGateClient::from_config(&ClientConfig {
            base_url: "http://127.0.0.1:9/api".to_string(),
            timeout_secs: 2,
        })
        .unwrap();

        assert!(client.fetch_market_state("BTC/USDT", "15m").await.is_err());
        assert!(client.popular_symbols("binance", 10).await.is_err());
    }

    #[tokio::test]
    async fn test_blank_search_skips_request() {
        // Unreachable backend: any request would fail
        let client = TradeGateClient::new("http://127.0.0.1:9/api");

        let symbols = client.search_symbols("   ", 10).await.unwrap();
        assert!(symbols.is_empty());
        assert!(client.search_symbols("btc", 10).await.is_err());
    }
}
