mod errors;
mod reconciliation_api;
mod storefront_api;

pub use errors::ReconciliationError;
pub use reconciliation_api::{IgnoreReason, ReconcileOutcome, ReconciliationApi};
pub use storefront_api::{CheckoutApi, StorefrontApi};
