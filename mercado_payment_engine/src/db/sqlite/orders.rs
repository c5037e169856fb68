use chrono::{DateTime, Utc};
use log::{debug, trace};
use mpg_common::Money;
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteConnection};

use crate::{
    db::{common::InsertOrderResult, sqlite::SqliteDatabaseError},
    db_types::{LineItem, NewOrder, Order, OrderId, OrderStatusType, VerifiedPayment},
};

const ORDER_COLUMNS: &str = "id, user_id, user_name, user_email, user_phone, items, total, status, \
                             shipping_address, payment_id, merchant_order_id, currency, transaction_amount, \
                             payment_status, paid_at, stock_adjusted, created_at, updated_at";

impl FromRow<'_, SqliteRow> for Order {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let items_json: String = row.try_get("items")?;
        let items: Vec<LineItem> = serde_json::from_str(&items_json)
            .map_err(|e| sqlx::Error::ColumnDecode { index: "items".to_string(), source: Box::new(e) })?;
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatusType>()
            .map_err(|e| sqlx::Error::ColumnDecode { index: "status".to_string(), source: Box::new(e) })?;
        Ok(Order {
            id: row.try_get::<String, _>("id")?.into(),
            user_id: row.try_get("user_id")?,
            user_name: row.try_get("user_name")?,
            user_email: row.try_get("user_email")?,
            user_phone: row.try_get("user_phone")?,
            items,
            total: Money::from(row.try_get::<i64, _>("total")?),
            status,
            shipping_address: row.try_get("shipping_address")?,
            payment_id: row.try_get("payment_id")?,
            merchant_order_id: row.try_get("merchant_order_id")?,
            currency: row.try_get("currency")?,
            transaction_amount: row.try_get::<Option<i64>, _>("transaction_amount")?.map(Money::from),
            payment_status: row.try_get("payment_status")?,
            paid_at: row.try_get("paid_at")?,
            stock_adjusted: row.try_get("stock_adjusted")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Inserts a new order, tolerating duplicates. A row that already exists for the order id, or a unique-constraint
/// violation on the payment id, reports `AlreadyExists` — the first write wins and the caller treats the repeat as
/// already processed.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, SqliteDatabaseError> {
    if fetch_order_by_id(&order.id, conn).await?.is_some() {
        return Ok(InsertOrderResult::AlreadyExists(order.id));
    }
    let id = order.id.clone();
    match insert_order(order, conn).await {
        Ok(()) => Ok(InsertOrderResult::Inserted(id)),
        Err(SqliteDatabaseError::QueryError(sqlx::Error::Database(e))) if e.is_unique_violation() => {
            debug!("🗃️ Insert for order {id} hit a unique constraint. Treating as already processed.");
            Ok(InsertOrderResult::AlreadyExists(id))
        },
        Err(e) => Err(e),
    }
}

async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    let items = serde_json::to_string(&order.items)?;
    sqlx::query(
        r#"
            INSERT INTO orders (
                id, user_id, user_name, user_email, user_phone, items, total, status, shipping_address,
                payment_id, merchant_order_id, currency, transaction_amount, payment_status, paid_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
    )
    .bind(order.id.as_str())
    .bind(&order.user_id)
    .bind(&order.user_name)
    .bind(&order.user_email)
    .bind(&order.user_phone)
    .bind(items)
    .bind(order.total.value())
    .bind(order.status.to_string())
    .bind(&order.shipping_address)
    .bind(&order.payment_id)
    .bind(&order.merchant_order_id)
    .bind(&order.currency)
    .bind(order.transaction_amount.value())
    .bind(&order.payment_status)
    .bind(order.paid_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_order_by_id(
    id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&query).bind(id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_payment_id(
    payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_id = $1");
    let order = sqlx::query_as::<_, Order>(&query).bind(payment_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_orders_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC");
    let orders = sqlx::query_as::<_, Order>(&query).bind(user_id).fetch_all(conn).await?;
    Ok(orders)
}

pub async fn fetch_all_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, SqliteDatabaseError> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");
    let orders = sqlx::query_as::<_, Order>(&query).fetch_all(conn).await?;
    Ok(orders)
}

/// Applies a reconciliation transition: new status plus the payment metadata from the fetched record. `paid_at`
/// only overwrites the stored value when provided, so a later non-paying transition keeps the original timestamp.
pub async fn update_order_from_payment(
    id: &OrderId,
    status: OrderStatusType,
    payment: &VerifiedPayment,
    paid_at: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    trace!("🗃️ Order {id} transitioning to {status} from payment {}", payment.payment_id);
    sqlx::query(
        r#"
            UPDATE orders SET
                status = $1,
                payment_id = $2,
                merchant_order_id = $3,
                currency = $4,
                transaction_amount = $5,
                payment_status = $6,
                paid_at = COALESCE($7, paid_at),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $8
        "#,
    )
    .bind(status.to_string())
    .bind(&payment.payment_id)
    .bind(&payment.merchant_order_id)
    .bind(&payment.currency)
    .bind(payment.amount.value())
    .bind(&payment.status)
    .bind(paid_at)
    .bind(id.as_str())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn update_order_status(
    id: &OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    sqlx::query("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(status.to_string())
        .bind(id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

/// Claims the inventory decrement for this order. Returns true for exactly one caller; repeats and replays see
/// false and must skip the decrement.
pub async fn mark_stock_adjusted(id: &OrderId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE orders SET stock_adjusted = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND stock_adjusted = 0",
    )
    .bind(id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
