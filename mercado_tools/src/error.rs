use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MercadoApiError {
    #[error("Could not initialize the Mercado Pago API client. {0}")]
    Initialization(String),
    #[error("Error sending request to the Mercado Pago API. {0}")]
    RequestError(String),
    #[error("Payment {0} was not found")]
    PaymentNotFound(String),
    #[error("The Mercado Pago API returned a server error. {status}: {message}")]
    UpstreamError { status: u16, message: String },
    #[error("The Mercado Pago API rejected the request. {status}: {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize the Mercado Pago response. {0}")]
    JsonError(String),
}

impl MercadoApiError {
    /// Transient errors are worth retrying; everything else is terminal. A 404 in particular is terminal, since the
    /// provider may notify about payments that are not queryable at all.
    pub fn is_transient(&self) -> bool {
        matches!(self, MercadoApiError::RequestError(_) | MercadoApiError::UpstreamError { .. })
    }
}
