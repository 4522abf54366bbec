use crate::domain::ports::{GatewayError, GatewayReceipt, WithdrawalGateway};
use crate::domain::withdrawal::WithdrawalRequest;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// JSON body of a withdrawal call: `{"address": "...", "amount": 5.0}`.
#[derive(Debug, Serialize)]
struct WithdrawalBody<'a> {
    address: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

#[derive(Debug, Default, Deserialize)]
struct WithdrawalResponse {
    #[serde(alias = "id")]
    transaction_id: Option<String>,
}

/// Sends withdrawals to a payment gateway over HTTPS.
///
/// Requests are authenticated with a bearer token and carry the withdrawal's
/// idempotency key, so a retried request cannot pay out twice.
pub struct HttpWithdrawalGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpWithdrawalGateway {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl WithdrawalGateway for HttpWithdrawalGateway {
    async fn send(
        &self,
        request: &WithdrawalRequest,
    ) -> std::result::Result<GatewayReceipt, GatewayError> {
        let body = WithdrawalBody {
            address: request.destination.as_str(),
            amount: request.amount.value(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(IDEMPOTENCY_KEY_HEADER, request.idempotency_key.to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Retryable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &text));
        }

        // A body is optional; fall back to our own key as the reference.
        let parsed: WithdrawalResponse = response.json().await.unwrap_or_default();
        Ok(GatewayReceipt {
            transaction_id: parsed
                .transaction_id
                .unwrap_or_else(|| request.idempotency_key.to_string()),
        })
    }
}

/// Maps a non-2xx status to a gateway error. Server errors, 408 and 429 are
/// worth retrying; anything else is a rejection of this request.
pub fn classify_failure(status: StatusCode, body: &str) -> GatewayError {
    let reason = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };

    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        GatewayError::Retryable(reason)
    } else {
        GatewayError::Permanent(reason)
    }
}
