//! Payment processor port and the Stripe adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::CampaignId;
use crate::error::ServiceError;

/// A payment intent opened with the processor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    /// Processor-side identifier, later echoed by the webhook.
    pub id: String,
    /// Secret the client uses to complete the payment.
    pub client_secret: String,
}

/// Parameters for opening a payment intent.
#[derive(Debug, Clone)]
pub struct IntentRequest<'a> {
    /// Amount in minor units.
    pub amount: i64,
    /// Lower-case ISO currency code.
    pub currency: &'a str,
    /// Campaign receiving the donation.
    pub campaign_id: CampaignId,
    /// Donation identifier, used as the idempotency key so a retried call
    /// never opens a second intent.
    pub idempotency_key: uuid::Uuid,
}

/// Opens payment intents.
#[async_trait]
pub trait PaymentProcessor: Send + Sync + std::fmt::Debug {
    /// Opens an intent for `request`.
    ///
    /// Connection and timeout failures surface as
    /// [`ServiceError::Unavailable`]; refusals as [`ServiceError::Payment`].
    async fn create_payment_intent(
        &self,
        request: &IntentRequest<'_>,
    ) -> Result<PaymentIntent, ServiceError>;
}

/// Stripe REST client (`POST /v1/payment_intents`).
#[derive(Debug, Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    /// Creates a client for `api_base` authenticating with `secret_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Internal`] if the HTTP client cannot be built.
    pub fn new(
        api_base: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_payment_intent(
        &self,
        request: &IntentRequest<'_>,
    ) -> Result<PaymentIntent, ServiceError> {
        let form = [
            ("amount", request.amount.to_string()),
            ("currency", request.currency.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[campaign_id]", request.campaign_id.to_string()),
            ("metadata[donation_id]", request.idempotency_key.to_string()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", request.idempotency_key.to_string())
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ServiceError::Unavailable(format!(
                "payment processor returned {status}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Payment(format!(
                "payment processor returned {status}: {body}"
            )));
        }

        response
            .json::<PaymentIntent>()
            .await
            .map_err(|e| ServiceError::Payment(format!("malformed payment intent: {e}")))
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() || err.is_connect() {
        ServiceError::Unavailable(err.to_string())
    } else {
        ServiceError::Payment(err.to_string())
    }
}

/// Processor used when no payment credentials are configured; refuses
/// every intent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledProcessor;

#[async_trait]
impl PaymentProcessor for DisabledProcessor {
    async fn create_payment_intent(
        &self,
        _request: &IntentRequest<'_>,
    ) -> Result<PaymentIntent, ServiceError> {
        Err(ServiceError::Payment(
            "payment processing is not configured".to_string(),
        ))
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Issues sequential intents; the first `fail_first` calls fail with a
    /// retryable error.
    #[derive(Debug, Default)]
    pub(crate) struct MockProcessor {
        pub(crate) calls: AtomicU32,
        pub(crate) fail_first: u32,
    }

    #[async_trait]
    impl PaymentProcessor for MockProcessor {
        async fn create_payment_intent(
            &self,
            request: &IntentRequest<'_>,
        ) -> Result<PaymentIntent, ServiceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(ServiceError::Unavailable("connection reset".to_string()));
            }
            Ok(PaymentIntent {
                id: format!("pi_{}", request.idempotency_key.simple()),
                client_secret: format!("secret_{call}"),
            })
        }
    }
}
