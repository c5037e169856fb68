use crate::db_types::OrderId;

/// Result of an idempotent order insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    Inserted(OrderId),
    /// The order (or its payment id) was already present. Not an error: a concurrent or repeated webhook lost the
    /// race, and the first write stands.
    AlreadyExists(OrderId),
}
