//! Event hooks for order lifecycle transitions.
//!
//! The reconciliation engine emits an event when an order transitions into `Paid`, and when it is annulled
//! (rejected, refunded, charged back, disputed). Integrations that live outside the core flow — fulfilment,
//! buyer notifications — subscribe through [`EventHooks`] without the engine knowing about them.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderAnnulledEvent, OrderPaidEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
