use thiserror::Error;

use crate::db::traits::PaymentGatewayError;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database error: {0}")]
    QueryError(#[from] sqlx::Error),
    #[error("Could not encode line items: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<SqliteDatabaseError> for PaymentGatewayError {
    fn from(e: SqliteDatabaseError) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
