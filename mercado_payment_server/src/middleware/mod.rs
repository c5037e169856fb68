mod api_key;
mod signature;

pub use api_key::{AdminKeyMiddlewareFactory, AdminKeyMiddlewareService};
pub use signature::{verify_signature, SignatureError, SignatureMiddlewareFactory, SignatureMiddlewareService};
