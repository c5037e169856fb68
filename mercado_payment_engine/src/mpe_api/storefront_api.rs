use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    db_types::{CheckoutIntent, Order, OrderId, OrderStatusType, Product},
    CatalogManagement,
    CheckoutIntentStore,
    OrderManagement,
    PaymentGatewayError,
};

/// Read paths consumed by the storefront UI and the admin dashboard, plus the administrative status override.
pub struct StorefrontApi<B> {
    db: B,
}

impl<B> Debug for StorefrontApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StorefrontApi")
    }
}

impl<B> StorefrontApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> StorefrontApi<B>
where B: OrderManagement
{
    pub async fn order_by_id(&self, id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        self.db.order_by_id(id).await
    }

    pub async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, PaymentGatewayError> {
        self.db.orders_for_user(user_id).await
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>, PaymentGatewayError> {
        self.db.fetch_all_orders().await
    }

    /// Admin override. Bypasses the provider transition guard on purpose; the race with reconciliation is an
    /// accepted operational risk.
    pub async fn override_order_status(
        &self,
        id: &OrderId,
        status: OrderStatusType,
    ) -> Result<Order, PaymentGatewayError> {
        let order =
            self.db.order_by_id(id).await?.ok_or_else(|| PaymentGatewayError::OrderNotFound(id.clone()))?;
        info!("🛠️ Admin override: order {id} status {} -> {status}", order.status);
        self.db.set_order_status(id, status).await?;
        self.db.order_by_id(id).await?.ok_or_else(|| PaymentGatewayError::OrderNotFound(id.clone()))
    }
}

impl<B> StorefrontApi<B>
where B: CatalogManagement
{
    pub async fn products(&self) -> Result<Vec<Product>, PaymentGatewayError> {
        self.db.fetch_all_products().await
    }
}

/// The checkout-intent producer API: stores the buyer's cart and quoted total before the redirect to hosted
/// checkout, with the configured TTL.
pub struct CheckoutApi<B> {
    db: B,
    ttl: Duration,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi(ttl = {:?})", self.ttl)
    }
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B, ttl: Duration) -> Self {
        Self { db, ttl }
    }
}

impl<B> CheckoutApi<B>
where B: CheckoutIntentStore
{
    pub async fn store_intent(&self, order_id: &OrderId, intent: &CheckoutIntent) -> Result<(), PaymentGatewayError> {
        debug!("🧾️ Storing checkout intent for order {order_id} (ttl {:?})", self.ttl);
        self.db.put_intent(order_id, intent, self.ttl).await
    }
}
