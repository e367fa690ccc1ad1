//! Simulated Apple Pay: every checkout settles at once.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{CheckoutRequest, PaymentGateway, PaymentGatewayError};
use crate::domain::{CheckoutSession, PaymentStatus};

/// Stand-in for an Apple Pay merchant integration.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockApplePayGateway;

#[async_trait]
impl PaymentGateway for MockApplePayGateway {
    async fn open_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        info!(payment_id = %request.payment_id, "simulated apple pay charge");
        Ok(CheckoutSession {
            reference: format!("applepay_{}", request.payment_id.as_uuid().simple()),
            checkout_url: None,
            status: PaymentStatus::Succeeded,
        })
    }
}
