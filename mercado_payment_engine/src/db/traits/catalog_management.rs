use crate::db_types::Product;

use super::PaymentGatewayError;

/// Catalog access. The catalog component owns product rows; the engine reads them and writes the stock counter
/// when orders are paid.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement: Clone {
    async fn product_by_id(&self, product_id: &str) -> Result<Option<Product>, PaymentGatewayError>;

    /// Every product, newest first.
    async fn fetch_all_products(&self) -> Result<Vec<Product>, PaymentGatewayError>;

    /// Writes the absolute stock value. Callers clamp at zero; stock never goes negative.
    async fn set_product_stock(&self, product_id: &str, stock: i64) -> Result<(), PaymentGatewayError>;
}
