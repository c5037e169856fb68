use std::time::Duration;

use chrono::{DateTime, Utc};
use mercado_payment_engine::{
    db_types::{CheckoutIntent, NewOrder, Order, OrderId, OrderStatusType, Product, VerifiedPayment},
    CatalogManagement,
    CheckoutIntentStore,
    InsertOrderResult,
    OrderManagement,
    PaymentGatewayDatabase,
    PaymentGatewayError,
};
use mercado_tools::{MercadoApiError, PaymentProvider, PaymentRecord};
use mockall::mock;
use mpg_common::Money;

mock! {
    pub Backend {}

    impl Clone for Backend {
        fn clone(&self) -> Self;
    }

    impl PaymentGatewayDatabase for Backend {
        fn url(&self) -> &str;
        async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;
        async fn fetch_order_by_payment_id(&self, payment_id: &str) -> Result<Option<Order>, PaymentGatewayError>;
        async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, PaymentGatewayError>;
        async fn update_order_from_payment(
            &self,
            id: &OrderId,
            status: OrderStatusType,
            payment: &VerifiedPayment,
            paid_at: Option<DateTime<Utc>>,
        ) -> Result<(), PaymentGatewayError>;
        async fn mark_stock_adjusted(&self, id: &OrderId) -> Result<bool, PaymentGatewayError>;
    }

    impl CheckoutIntentStore for Backend {
        async fn put_intent(
            &self,
            order_id: &OrderId,
            intent: &CheckoutIntent,
            ttl: Duration,
        ) -> Result<(), PaymentGatewayError>;
        async fn fetch_intent(&self, order_id: &OrderId) -> Result<Option<CheckoutIntent>, PaymentGatewayError>;
        async fn delete_intent(&self, order_id: &OrderId) -> Result<(), PaymentGatewayError>;
        async fn purge_expired_intents(&self) -> Result<u64, PaymentGatewayError>;
    }

    impl CatalogManagement for Backend {
        async fn product_by_id(&self, product_id: &str) -> Result<Option<Product>, PaymentGatewayError>;
        async fn fetch_all_products(&self) -> Result<Vec<Product>, PaymentGatewayError>;
        async fn set_product_stock(&self, product_id: &str, stock: i64) -> Result<(), PaymentGatewayError>;
    }

    impl OrderManagement for Backend {
        async fn order_by_id(&self, id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;
        async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, PaymentGatewayError>;
        async fn fetch_all_orders(&self) -> Result<Vec<Order>, PaymentGatewayError>;
        async fn set_order_status(&self, id: &OrderId, status: OrderStatusType) -> Result<(), PaymentGatewayError>;
    }
}

mock! {
    pub Provider {}

    impl Clone for Provider {
        fn clone(&self) -> Self;
    }

    impl PaymentProvider for Provider {
        async fn payment_by_id(&self, payment_id: &str) -> Result<PaymentRecord, MercadoApiError>;
    }
}

pub const TEST_ORDER_ID: &str = "7f38b3f1-54a5-4b8e-9f0a-0a4f3ddc8a11";

pub fn sample_order(status: OrderStatusType) -> Order {
    Order {
        id: OrderId(TEST_ORDER_ID.to_string()),
        user_id: None,
        user_name: "Cliente".to_string(),
        user_email: String::new(),
        user_phone: String::new(),
        items: vec![],
        total: Money::from_pesos(1000),
        status,
        shipping_address: String::new(),
        payment_id: Some("555".to_string()),
        merchant_order_id: None,
        currency: Some("MXN".to_string()),
        transaction_amount: Some(Money::from_pesos(1000)),
        payment_status: Some("approved".to_string()),
        paid_at: (status == OrderStatusType::Paid).then(Utc::now),
        stock_adjusted: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn sample_payment_record(status: &str, amount_pesos: f64, currency: &str) -> PaymentRecord {
    PaymentRecord {
        id: 555,
        status: status.to_string(),
        currency_id: currency.to_string(),
        transaction_amount: Money::try_from(amount_pesos).unwrap(),
        external_reference: Some(TEST_ORDER_ID.to_string()),
        order: None,
        date_approved: None,
    }
}
