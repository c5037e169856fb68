use std::time::Duration;

use crate::db_types::{CheckoutIntent, OrderId};

use super::PaymentGatewayError;

/// The provisional-order cache: short-lived correlation storage keyed by order id.
///
/// The checkout path writes an intent before redirecting the buyer to hosted checkout; the reconciliation engine
/// reads it once when the first accepted webhook arrives, then deletes it. Entries expire unconditionally after the
/// TTL, whether or not they were ever read — an expired entry is a normal condition, not an error, and forces the
/// engine to fall back to placeholder order data.
///
/// Implementations must be shared-store backed (not process memory) so the contract survives restarts and multiple
/// server instances.
#[allow(async_fn_in_trait)]
pub trait CheckoutIntentStore: Clone {
    /// Stores `intent` under `order_id`, overwriting any existing entry and restarting its TTL.
    async fn put_intent(
        &self,
        order_id: &OrderId,
        intent: &CheckoutIntent,
        ttl: Duration,
    ) -> Result<(), PaymentGatewayError>;

    /// Returns the stored intent, or `None` if absent or expired.
    async fn fetch_intent(&self, order_id: &OrderId) -> Result<Option<CheckoutIntent>, PaymentGatewayError>;

    /// Removes the entry immediately. Removing an absent entry is a no-op.
    async fn delete_intent(&self, order_id: &OrderId) -> Result<(), PaymentGatewayError>;

    /// Deletes every expired entry, returning how many were removed. Run periodically by the sweeper worker; reads
    /// already filter on expiry, so this only reclaims space.
    async fn purge_expired_intents(&self) -> Result<u64, PaymentGatewayError>;
}
