use std::time::Duration;

use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{CheckoutIntent, OrderId},
};

/// Upserts the intent with a fresh expiry. A repeat `put` for the same order id overwrites the payload and restarts
/// the TTL.
pub async fn put_intent(
    order_id: &OrderId,
    intent: &CheckoutIntent,
    ttl: Duration,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let payload = serde_json::to_string(intent)?;
    let expires_at = Utc::now().timestamp() + ttl.as_secs() as i64;
    sqlx::query(
        r#"
            INSERT INTO checkout_intents (order_id, payload, expires_at) VALUES ($1, $2, $3)
            ON CONFLICT (order_id) DO UPDATE SET payload = excluded.payload, expires_at = excluded.expires_at
        "#,
    )
    .bind(order_id.as_str())
    .bind(payload)
    .bind(expires_at)
    .execute(conn)
    .await?;
    trace!("🧾️ Checkout intent stored for order {order_id}, expires at {expires_at}");
    Ok(())
}

/// Expired rows behave as absent regardless of whether the sweeper has removed them yet.
pub async fn fetch_intent(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<CheckoutIntent>, SqliteDatabaseError> {
    let now = Utc::now().timestamp();
    let payload: Option<String> =
        sqlx::query_scalar("SELECT payload FROM checkout_intents WHERE order_id = $1 AND expires_at > $2")
            .bind(order_id.as_str())
            .bind(now)
            .fetch_optional(conn)
            .await?;
    payload.map(|p| serde_json::from_str(&p)).transpose().map_err(SqliteDatabaseError::from)
}

pub async fn delete_intent(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query("DELETE FROM checkout_intents WHERE order_id = $1").bind(order_id.as_str()).execute(conn).await?;
    Ok(())
}

pub async fn purge_expired(conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    let now = Utc::now().timestamp();
    let result = sqlx::query("DELETE FROM checkout_intents WHERE expires_at <= $1").bind(now).execute(conn).await?;
    Ok(result.rows_affected())
}
