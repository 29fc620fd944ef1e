//! HTTP client for a token ledger gateway.
//!
//! The gateway holds the treasury signing key and exposes two endpoints:
//!
//! - `POST {endpoint}/transfer` with `{"to": "<address>", "amount": "<base units>"}`,
//!   answering `{"transaction_id": "<id>"}` once the transfer is mined.
//! - `GET {endpoint}/balance/{address}`, answering `{"balance": "<base units>"}`.
//!
//! Amounts travel as decimal strings because 18-decimal values overflow JSON numbers.

use std::time::Duration;

use cleanchain_types::{TxId, WalletId};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{LedgerError, TokenLedger, TransferReceipt};

/// Default timeout for gateway requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct TransferRequest<'a> {
    to: &'a str,
    amount: String,
}

#[derive(Deserialize)]
struct TransferResponse {
    transaction_id: String,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Client for a ledger gateway.
pub struct HttpLedgerClient {
    endpoint: String,
    api_key: Option<String>,
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
}

impl HttpLedgerClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_timeout(endpoint, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            http_client,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn do_transfer(&self, to: &WalletId, amount: u128) -> Result<TransferReceipt, LedgerError> {
        let url = format!("{}/transfer", self.endpoint);
        let body = TransferRequest {
            to: to.as_str(),
            amount: amount.to_string(),
        };
        debug!(%to, amount = %amount, "sending ledger transfer");

        let response = self
            .authorize(self.http_client.post(&url).json(&body))
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if status.is_client_error() {
            let reason = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("HTTP status {status}"));
            return Err(LedgerError::Rejected(reason));
        }
        if !status.is_success() {
            return Err(LedgerError::RequestFailed(format!("HTTP status {status}")));
        }

        let parsed: TransferResponse = response.json().await.map_err(|e| {
            LedgerError::InvalidResponse(format!("failed to parse transfer response: {e}"))
        })?;
        Ok(TransferReceipt {
            tx_id: TxId::new(parsed.transaction_id),
        })
    }

    async fn do_balance(&self, address: &WalletId) -> Result<u128, LedgerError> {
        let url = format!("{}/balance/{}", self.endpoint, address);
        let response = self
            .authorize(self.http_client.get(&url))
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(LedgerError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let parsed: BalanceResponse = response.json().await.map_err(|e| {
            LedgerError::InvalidResponse(format!("failed to parse balance response: {e}"))
        })?;
        parse_units(&parsed.balance)
    }
}

impl TokenLedger for HttpLedgerClient {
    fn transfer<'a>(
        &'a self,
        to: &'a WalletId,
        amount: u128,
    ) -> BoxFuture<'a, Result<TransferReceipt, LedgerError>> {
        Box::pin(self.do_transfer(to, amount))
    }

    fn balance_of<'a>(&'a self, address: &'a WalletId) -> BoxFuture<'a, Result<u128, LedgerError>> {
        Box::pin(self.do_balance(address))
    }

    fn name(&self) -> &str {
        "http-gateway"
    }
}

fn map_send_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Unreachable(format!("request timed out: {e}"))
    } else if e.is_connect() {
        LedgerError::Unreachable(format!("connection failed: {e}"))
    } else {
        LedgerError::RequestFailed(e.to_string())
    }
}

/// Parse a decimal base-unit string.
pub fn parse_units(raw: &str) -> Result<u128, LedgerError> {
    raw.trim()
        .parse::<u128>()
        .map_err(|e| LedgerError::InvalidResponse(format!("bad amount {raw:?}: {e}")))
}
