use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db::{
        common::InsertOrderResult,
        traits::{CatalogManagement, CheckoutIntentStore},
    },
    db_types::{NewOrder, Order, OrderId, OrderStatusType, VerifiedPayment},
};

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} was not found")]
    OrderNotFound(OrderId),
    #[error("Stored record is corrupt: {0}")]
    CorruptRecord(String),
}

/// The write-side contract the reconciliation engine needs from a backend.
///
/// Correctness under concurrent webhook delivery rests on this trait's semantics: [`insert_order`] must be
/// idempotent (a duplicate `id` or `payment_id` reports [`InsertOrderResult::AlreadyExists`] rather than creating a
/// second row), because there is no lock serialising webhooks for the same order.
///
/// [`insert_order`]: PaymentGatewayDatabase::insert_order
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + CheckoutIntentStore + CatalogManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Fetches the order with the given id, or `None`. Absence is a normal condition before the first webhook lands.
    async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Fetches the order that recorded the given provider payment id. This is the strongest idempotency key: a
    /// payment id must never be applied twice.
    async fn fetch_order_by_payment_id(&self, payment_id: &str) -> Result<Option<Order>, PaymentGatewayError>;

    /// Inserts a new order. Duplicate order ids or payment ids yield `AlreadyExists`, never a second row.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, PaymentGatewayError>;

    /// Applies a status transition plus the payment metadata from a verified payment record. `paid_at` replaces the
    /// stored value only when `Some`.
    async fn update_order_from_payment(
        &self,
        id: &OrderId,
        status: OrderStatusType,
        payment: &VerifiedPayment,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<(), PaymentGatewayError>;

    /// Sets the order's stock-adjusted flag. Returns `true` if this call set it, `false` if it was already set —
    /// the caller must skip the inventory decrement in the latter case.
    async fn mark_stock_adjusted(&self, id: &OrderId) -> Result<bool, PaymentGatewayError>;
}
