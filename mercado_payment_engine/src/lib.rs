//! Mercado Payment Engine
//!
//! The engine reconciles the payment provider's webhook stream against the store's orders. It is the only component
//! that creates or mutates order rows, and it owns the invariants that make that safe: a payment id is applied at
//! most once, amounts are validated against the quoted total before any write, and stock is decremented exactly when
//! an order transitions into `Paid`.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). SQLite (via sqlx) is the supported backend. Access goes through
//!    the trait contracts in [`traits`]; the data types are defined in [`db_types`] and are public.
//! 2. The reconciliation API ([`ReconciliationApi`]), the state machine that turns a verified, re-fetched payment
//!    record into order writes and inventory adjustments.
//! 3. Client-side helpers that do no IO: the order-status polling state machine ([`mod@polling`]) used by the
//!    storefront while it waits for a webhook to land.
//!
//! The engine also emits events when orders are paid or annulled. A simple hook system ([`mod@events`]) lets
//! integrations (fulfilment, notifications) subscribe without coupling the reconciliation flow to them.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
mod mpe_api;
pub mod polling;

pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::{
    common::InsertOrderResult,
    traits::{CatalogManagement, CheckoutIntentStore, OrderManagement, PaymentGatewayDatabase, PaymentGatewayError},
};
pub use mpe_api::{CheckoutApi, IgnoreReason, ReconcileOutcome, ReconciliationApi, ReconciliationError, StorefrontApi};
