use mpg_common::Money;
use thiserror::Error;

use crate::{db_types::OrderId, PaymentGatewayError};

/// Failures that must surface to the provider as error responses, as opposed to outcomes that are acknowledged.
#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    /// The payment settled in the wrong currency. A serious integration fault; never silently acknowledged.
    #[error("Payment {payment_id} is in {actual}, expected {expected}")]
    CurrencyMismatch { payment_id: String, expected: String, actual: String },
    /// The paid amount disagrees with the quoted total beyond tolerance. Treated as suspected tampering.
    #[error("Paid amount {paid} does not match the expected total {expected} for order {order_id}")]
    AmountMismatch { order_id: OrderId, expected: Money, paid: Money },
    /// A storage failure. The provider is asked to retry; idempotency makes the retry safe.
    #[error(transparent)]
    DatabaseError(#[from] PaymentGatewayError),
}
