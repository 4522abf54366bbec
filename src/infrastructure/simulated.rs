use crate::domain::ports::{GatewayError, GatewayReceipt, WithdrawalGateway};
use crate::domain::withdrawal::WithdrawalRequest;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

type GatewayOutcome = Result<GatewayReceipt, GatewayError>;

/// An in-process gateway that never touches the network.
///
/// Queued outcomes are returned in order; once the queue is empty every
/// withdrawal succeeds with a transaction id derived from its idempotency
/// key. Every request is recorded. Clones share the same queue and record.
#[derive(Default, Clone)]
pub struct SimulatedGateway {
    outcomes: Arc<Mutex<VecDeque<GatewayOutcome>>>,
    requests: Arc<Mutex<Vec<WithdrawalRequest>>>,
    latency: Duration,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every answer by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn push_outcome(&self, outcome: GatewayOutcome) {
        self.outcomes.lock().await.push_back(outcome);
    }

    /// Requests received so far, retries included.
    pub async fn requests(&self) -> Vec<WithdrawalRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl WithdrawalGateway for SimulatedGateway {
    async fn send(&self, request: &WithdrawalRequest) -> GatewayOutcome {
        self.requests.lock().await.push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.outcomes.lock().await.pop_front() {
            Some(outcome) => outcome,
            None => Ok(GatewayReceipt {
                transaction_id: format!("sim-{}", request.idempotency_key),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountId;
    use crate::domain::money::Amount;
    use crate::domain::withdrawal::WalletAddress;
    use rust_decimal_macros::dec;

    fn request() -> WithdrawalRequest {
        WithdrawalRequest::new(
            AccountId(1),
            WalletAddress::parse("0xabc").unwrap(),
            Amount::new(dec!(1)).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_scripted_outcomes_then_success() {
        let gateway = SimulatedGateway::new();
        gateway
            .push_outcome(Err(GatewayError::Permanent("nope".to_string())))
            .await;

        let request = request();
        assert!(gateway.send(&request).await.is_err());
        let receipt = gateway.send(&request).await.unwrap();
        assert_eq!(
            receipt.transaction_id,
            format!("sim-{}", request.idempotency_key)
        );
        assert_eq!(gateway.requests().await.len(), 2);
    }
}
