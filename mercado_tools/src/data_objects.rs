use chrono::{DateTime, Utc};
use mpg_common::{serde_pesos, Money};
use serde::{Deserialize, Serialize};

/// The authoritative payment record, as returned by `GET /v1/payments/{id}`.
///
/// Only the fields reconciliation consumes are modelled; the provider sends many more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    pub status: String,
    pub currency_id: String,
    #[serde(with = "serde_pesos")]
    pub transaction_amount: Money,
    /// The merchant-assigned order id this payment settles. Correlation key back to local orders.
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub order: Option<MerchantOrderRef>,
    #[serde(default)]
    pub date_approved: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantOrderRef {
    pub id: i64,
}
