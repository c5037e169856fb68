use crate::db_types::{Order, OrderId, OrderStatusType};

use super::PaymentGatewayError;

/// Read paths over orders, plus the administrative status override.
///
/// The override is the out-of-band write (`Shipped`, `Completed`, manual corrections) that coexists with the
/// reconciliation engine. The two writers are not coordinated; that race is an accepted operational risk.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    async fn order_by_id(&self, id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// All orders for a user, newest first.
    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Every order in the store, newest first.
    async fn fetch_all_orders(&self) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Unconditionally sets the order status. Admin path; not subject to the provider transition guard.
    async fn set_order_status(&self, id: &OrderId, status: OrderStatusType) -> Result<(), PaymentGatewayError>;
}
