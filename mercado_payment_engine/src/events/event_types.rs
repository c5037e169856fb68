use crate::db_types::{Order, OrderStatusType};

/// Emitted exactly when an order transitions into `Paid` (including create-as-paid).
#[derive(Debug, Clone)]
pub struct OrderPaidEvent {
    pub order: Order,
}

/// Emitted when an order reaches a terminal failure state from a provider signal.
#[derive(Debug, Clone)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    /// The terminal status that was applied: `Rejected`, `Refunded`, `ChargedBack` or `InDispute`.
    pub status: OrderStatusType,
}
