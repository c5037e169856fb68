#![allow(dead_code)]
use mercado_payment_engine::{
    db_types::{CheckoutIntent, LineItem, VerifiedPayment},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    ReconciliationApi,
    SqliteDatabase,
};
use mpg_common::{Money, MXN_CURRENCY_CODE};

pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to test database")
}

pub fn reconciler(db: SqliteDatabase) -> ReconciliationApi<SqliteDatabase> {
    ReconciliationApi::new(db, MXN_CURRENCY_CODE.to_string(), EventProducers::default())
}

pub async fn seed_product(db: &SqliteDatabase, id: &str, name: &str, price_pesos: i64, stock: i64) {
    sqlx::query("INSERT INTO products (id, name, price, stock) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(name)
        .bind(Money::from_pesos(price_pesos).value())
        .bind(stock)
        .execute(db.pool())
        .await
        .expect("Error seeding product");
}

pub async fn product_stock(db: &SqliteDatabase, id: &str) -> i64 {
    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
        .bind(id)
        .fetch_one(db.pool())
        .await
        .expect("Error reading product stock")
}

pub async fn order_count(db: &SqliteDatabase) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(db.pool()).await.expect("Error counting orders")
}

pub fn line_item(product_id: &str, name: &str, price_pesos: i64, quantity: i64) -> LineItem {
    LineItem {
        id: product_id.to_string(),
        name: name.to_string(),
        price: Money::from_pesos(price_pesos),
        quantity,
    }
}

pub fn intent_for(total_pesos: i64, items: Vec<LineItem>) -> CheckoutIntent {
    CheckoutIntent {
        user_id: Some("3a1f2c44-9b5e-4a2f-8c3d-6f7a8b9c0d1e".to_string()),
        user_name: Some("Ana Torres".to_string()),
        user_email: Some("ana@example.com".to_string()),
        user_phone: Some("5512345678".to_string()),
        items,
        total: Some(Money::from_pesos(total_pesos)),
        delivery_method: Some("shipping".to_string()),
        shipping_address: Some("Av. Reforma 123, CDMX".to_string()),
        pickup_location: None,
    }
}

pub fn payment(payment_id: &str, status: &str, amount_pesos: i64, order_ref: &str) -> VerifiedPayment {
    VerifiedPayment {
        payment_id: payment_id.to_string(),
        status: status.to_string(),
        currency: MXN_CURRENCY_CODE.to_string(),
        amount: Money::from_pesos(amount_pesos),
        order_ref: Some(order_ref.to_string()),
        merchant_order_id: None,
    }
}
