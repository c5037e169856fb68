use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqlitePool;

use super::{intents, new_pool, orders, products, SqliteDatabaseError};
use crate::{
    db::{
        common::InsertOrderResult,
        traits::{
            CatalogManagement,
            CheckoutIntentStore,
            OrderManagement,
            PaymentGatewayDatabase,
            PaymentGatewayError,
        },
    },
    db_types::{CheckoutIntent, NewOrder, Order, OrderId, OrderStatusType, Product, VerifiedPayment},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(orders::fetch_order_by_id(id, &mut conn).await?)
    }

    async fn fetch_order_by_payment_id(&self, payment_id: &str) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(orders::fetch_order_by_payment_id(payment_id, &mut conn).await?)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(orders::idempotent_insert(order, &mut conn).await?)
    }

    async fn update_order_from_payment(
        &self,
        id: &OrderId,
        status: OrderStatusType,
        payment: &VerifiedPayment,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(orders::update_order_from_payment(id, status, payment, paid_at, &mut conn).await?)
    }

    async fn mark_stock_adjusted(&self, id: &OrderId) -> Result<bool, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(orders::mark_stock_adjusted(id, &mut conn).await?)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn order_by_id(&self, id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(orders::fetch_order_by_id(id, &mut conn).await?)
    }

    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(orders::fetch_orders_for_user(user_id, &mut conn).await?)
    }

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(orders::fetch_all_orders(&mut conn).await?)
    }

    async fn set_order_status(&self, id: &OrderId, status: OrderStatusType) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(orders::update_order_status(id, status, &mut conn).await?)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn product_by_id(&self, product_id: &str) -> Result<Option<Product>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(products::fetch_product(product_id, &mut conn).await?)
    }

    async fn fetch_all_products(&self) -> Result<Vec<Product>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(products::fetch_all_products(&mut conn).await?)
    }

    async fn set_product_stock(&self, product_id: &str, stock: i64) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(products::update_stock(product_id, stock, &mut conn).await?)
    }
}

impl CheckoutIntentStore for SqliteDatabase {
    async fn put_intent(
        &self,
        order_id: &OrderId,
        intent: &CheckoutIntent,
        ttl: Duration,
    ) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(intents::put_intent(order_id, intent, ttl, &mut conn).await?)
    }

    async fn fetch_intent(&self, order_id: &OrderId) -> Result<Option<CheckoutIntent>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(intents::fetch_intent(order_id, &mut conn).await?)
    }

    async fn delete_intent(&self, order_id: &OrderId) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(intents::delete_intent(order_id, &mut conn).await?)
    }

    async fn purge_expired_intents(&self) -> Result<u64, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        Ok(intents::purge_expired(&mut conn).await?)
    }
}
