use log::*;
use mercado_payment_engine::{
    db_types::VerifiedPayment,
    events::{EventHandlers, EventHooks},
};
use mercado_tools::PaymentRecord;

pub const MERCADO_EVENT_BUFFER_SIZE: usize = 25;

/// Converts the provider's payment record into the engine's reconciliation input.
pub fn verified_payment_from_record(payment: &PaymentRecord) -> VerifiedPayment {
    VerifiedPayment {
        payment_id: payment.id.to_string(),
        status: payment.status.clone(),
        currency: payment.currency_id.clone(),
        amount: payment.transaction_amount,
        order_ref: payment.external_reference.clone(),
        merchant_order_id: payment.order.as_ref().map(|o| o.id.to_string()),
    }
}

/// Wires the storefront's order lifecycle hooks.
///
/// 1. OrderPaidEvent — the order is ready for fulfilment. Logged with enough context for the back office to act on;
///    the buyer's poller picks up the status change independently.
/// 2. OrderAnnulledEvent — a terminal failure was recorded, which the back office may need to follow up on
///    (restock, refund paperwork).
pub fn create_storefront_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        let order = ev.order;
        Box::pin(async move {
            info!(
                "🛒️ Order {} is paid and ready for fulfilment. {} item(s), {} — buyer {} <{}>",
                order.id,
                order.items.len(),
                order.total,
                order.user_name,
                order.user_email
            );
        })
    });
    hooks.on_order_annulled(|ev| {
        Box::pin(async move {
            warn!("🛒️ Order {} was annulled with status {}.", ev.order.id, ev.status);
        })
    });
    EventHandlers::new(MERCADO_EVENT_BUFFER_SIZE, hooks)
}
