//! REST gateway implementation.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use certbook::{
    Balances, CertificateType, ExecutionResult, MarketOrderRequest, MarketTrade, OpenOrder,
    OrderBookSnapshot, OrderPreview, PreviewRequest, ReferencePrices,
};

use crate::Gateway;
use crate::error::GatewayError;
use crate::wire::{
    MarketOrderBody, PreviewBody, WireBalances, WireExecution, WireOrder, WireOrderBook,
    WirePreview, WirePrices, WireTrade,
};

/// Async REST client for the trading backend.
pub struct RestGateway {
    client: reqwest::Client,
    base_url: String,
}

impl RestGateway {
    /// Create a new gateway against `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Connection(format!("client build failed: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::Connection(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Connection(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl Gateway for RestGateway {
    async fn order_book(
        &self,
        certificate: CertificateType,
    ) -> Result<OrderBookSnapshot, GatewayError> {
        let path = format!("/api/market/{}/orderbook", certificate.as_str());
        let wire: WireOrderBook = self.get_json(&path).await?;
        Ok(wire.normalize())
    }

    async fn recent_trades(
        &self,
        certificate: CertificateType,
        limit: usize,
    ) -> Result<Vec<MarketTrade>, GatewayError> {
        let path = format!("/api/market/{}/trades?limit={limit}", certificate.as_str());
        let wire: Vec<WireTrade> = self.get_json(&path).await?;
        Ok(wire.into_iter().map(WireTrade::normalize).collect())
    }

    async fn open_orders(&self) -> Result<Vec<OpenOrder>, GatewayError> {
        let wire: Vec<WireOrder> = self.get_json("/api/orders/open").await?;
        wire.into_iter().map(WireOrder::normalize).collect()
    }

    async fn balances(&self) -> Result<Balances, GatewayError> {
        let wire: WireBalances = self.get_json("/api/account/balances").await?;
        Ok(wire.normalize())
    }

    async fn preview_order(&self, request: &PreviewRequest) -> Result<OrderPreview, GatewayError> {
        let body = PreviewBody::from_request(request);
        let wire: WirePreview = self.post_json("/api/orders/preview", &body).await?;
        Ok(wire.normalize())
    }

    async fn execute_market_order(
        &self,
        request: &MarketOrderRequest,
    ) -> Result<ExecutionResult, GatewayError> {
        let body = MarketOrderBody::from_request(request);
        let wire: WireExecution = self.post_json("/api/orders/market", &body).await?;
        wire.normalize()
    }

    async fn current_prices(&self) -> Result<ReferencePrices, GatewayError> {
        let wire: WirePrices = self.get_json("/api/market/prices").await?;
        Ok(wire.normalize())
    }
}
