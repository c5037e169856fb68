//! # Mercado Payment Server
//! This crate hosts the HTTP surface of the payment gateway. It is responsible for:
//! * Listening for incoming payment webhooks from Mercado Pago, authenticating them, and handing the re-fetched
//!   payment record to the reconciliation engine.
//! * Serving the storefront's read paths (order polling, user orders, products) and the checkout-intent producer
//!   endpoint.
//! * The admin order-status override, behind a shared API key.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: liveness probe.
//! * `/api/pending-orders/{order_id}`: stores the checkout intent before the buyer is redirected to hosted checkout.
//! * `/api/orders/{order_id}`: the buyer's polling read. `404` means "webhook has not landed yet".
//! * `/api/user-orders/{user_id}`, `/api/products`: dashboard reads.
//! * `/api/all-orders`, `PUT /api/orders/{order_id}`: admin, `x-api-key` guarded.
//! * `/api/mp/webhook`: the reconciliation webhook, wrapped by the signature verifier.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod intent_sweeper;
pub mod mercado_routes;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
