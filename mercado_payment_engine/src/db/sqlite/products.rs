use sqlx::SqliteConnection;

use crate::{db::sqlite::SqliteDatabaseError, db_types::Product};

pub async fn fetch_product(
    product_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, SqliteDatabaseError> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, price, stock, image, description, created_at FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_all_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, SqliteDatabaseError> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, name, price, stock, image, description, created_at FROM products ORDER BY created_at DESC",
    )
    .fetch_all(conn)
    .await?;
    Ok(products)
}

pub async fn update_stock(
    product_id: &str,
    stock: i64,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    sqlx::query("UPDATE products SET stock = $1 WHERE id = $2").bind(stock).bind(product_id).execute(conn).await?;
    Ok(())
}
