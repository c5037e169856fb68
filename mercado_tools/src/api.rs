use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    StatusCode,
};

use crate::{config::MercadoConfig, data_objects::PaymentRecord, MercadoApiError};

pub const MAX_FETCH_ATTEMPTS: u32 = 3;
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Source of authoritative payment records.
///
/// The server's webhook handler is generic over this trait so that endpoint tests can substitute a mock provider for
/// the live API.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider: Clone {
    /// Fetches the canonical payment record for `payment_id`, retrying transient failures.
    async fn payment_by_id(&self, payment_id: &str) -> Result<PaymentRecord, MercadoApiError>;
}

#[derive(Clone)]
pub struct MercadoApi {
    config: MercadoConfig,
    client: Arc<Client>,
}

impl MercadoApi {
    pub fn new(config: MercadoConfig) -> Result<Self, MercadoApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.access_token.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| MercadoApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .map_err(|e| MercadoApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn payment_url(&self, payment_id: &str) -> String {
        format!("{}/v1/payments/{payment_id}", self.config.api_url.trim_end_matches('/'))
    }

    async fn fetch_payment_once(&self, payment_id: &str) -> Result<PaymentRecord, MercadoApiError> {
        let url = self.payment_url(payment_id);
        trace!("💳️ Fetching payment record: {url}");
        let response = self.client.get(url).send().await.map_err(|e| MercadoApiError::RequestError(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MercadoApiError::PaymentNotFound(payment_id.to_string()));
        }
        if status.is_server_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(MercadoApiError::UpstreamError { status: status.as_u16(), message });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MercadoApiError::QueryError { status: status.as_u16(), message });
        }
        response.json::<PaymentRecord>().await.map_err(|e| MercadoApiError::JsonError(e.to_string()))
    }
}

impl PaymentProvider for MercadoApi {
    /// Fetches the payment, retrying up to [`MAX_FETCH_ATTEMPTS`] times with exponential backoff (1s, 2s, 4s) on
    /// transient errors. Terminal errors (404, other 4xx, malformed JSON) are returned immediately.
    async fn payment_by_id(&self, payment_id: &str) -> Result<PaymentRecord, MercadoApiError> {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 1;
        loop {
            match self.fetch_payment_once(payment_id).await {
                Ok(payment) => {
                    trace!("💳️ Payment {payment_id} fetched successfully ({})", payment.status);
                    return Ok(payment);
                },
                Err(e) if e.is_transient() && attempt < MAX_FETCH_ATTEMPTS => {
                    warn!("💳️ Payment fetch attempt {attempt} for {payment_id} failed: {e}. Retrying in {backoff:?}");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                },
                Err(e) => return Err(e),
            }
        }
    }
}
