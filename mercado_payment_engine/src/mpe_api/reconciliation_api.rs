use std::fmt::{Debug, Display};

use chrono::Utc;
use log::*;

use crate::{
    db::common::InsertOrderResult,
    db_types::{
        map_provider_status,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        ProviderStatusMapping,
        VerifiedPayment,
    },
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    helpers::is_valid_order_ref,
    mpe_api::ReconciliationError,
    PaymentGatewayDatabase,
};

/// Buyer name recorded when the checkout intent expired before the webhook arrived.
pub const PLACEHOLDER_BUYER_NAME: &str = "Cliente";

/// How a verified payment notification was disposed of. Every variant is an acknowledgement; conditions that must
/// surface as provider-visible errors are [`ReconciliationError`]s instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    OrderCreated { id: OrderId, status: OrderStatusType },
    OrderUpdated { id: OrderId, from: OrderStatusType, to: OrderStatusType },
    /// This payment id has been applied before. No writes were performed.
    AlreadyProcessed { payment_id: String },
    /// The order already carries the mapped status. A true no-op: no writes, no side effects.
    Unchanged { id: OrderId, status: OrderStatusType },
    /// Nothing actionable. Acknowledged so the provider stops retrying.
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The payment record carries no external reference.
    MissingOrderRef,
    /// The external reference is not a well-formed order id. Refused for writes, but acknowledged.
    InvalidOrderRef(String),
    /// A rejected/cancelled payment for an order that was never created. It stays uncreated.
    FailedPaymentWithoutOrder,
    /// A provider status outside the mapping table.
    UnknownProviderStatus(String),
    /// An update-only status (refund, chargeback, dispute) for an order that does not exist.
    UpdateForMissingOrder(OrderId),
    /// The transition guard refused the change, e.g. a late `pending` after `approved`.
    RefusedTransition { id: OrderId, from: OrderStatusType, to: OrderStatusType },
}

impl Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IgnoreReason::MissingOrderRef => write!(f, "payment has no external reference"),
            IgnoreReason::InvalidOrderRef(r) => write!(f, "'{r}' is not a valid order reference"),
            IgnoreReason::FailedPaymentWithoutOrder => write!(f, "failed payment for an order that was never created"),
            IgnoreReason::UnknownProviderStatus(s) => write!(f, "provider status '{s}' is not handled"),
            IgnoreReason::UpdateForMissingOrder(id) => write!(f, "update-only status for missing order {id}"),
            IgnoreReason::RefusedTransition { id, from, to } => {
                write!(f, "transition {from} -> {to} refused for order {id}")
            },
        }
    }
}

/// The reconciliation state machine.
///
/// One instance handles every webhook; there is no per-order lock. Correctness under concurrent and repeated
/// delivery rests on the payment-id idempotency check, the backend's idempotent insert, and the stock-adjusted
/// claim flag.
pub struct ReconciliationApi<B> {
    db: B,
    settlement_currency: String,
    producers: EventProducers,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, settlement_currency: String, producers: EventProducers) -> Self {
        Self { db, settlement_currency, producers }
    }
}

impl<B> ReconciliationApi<B>
where B: PaymentGatewayDatabase
{
    /// Applies one verified payment record to the order store.
    ///
    /// The caller has already authenticated the webhook and re-fetched the payment from the provider; this method
    /// owns everything from reference validation onwards: the status mapping table, the currency gate, amount
    /// validation against the quoted total, idempotency, the insert-or-transition decision, the inventory
    /// adjustment on entry into `Paid`, and checkout-intent cleanup.
    pub async fn process_payment(&self, payment: VerifiedPayment) -> Result<ReconcileOutcome, ReconciliationError> {
        let Some(order_ref) = payment.order_ref.clone() else {
            warn!("🔄️ Payment {} has no external reference. Nothing to do.", payment.payment_id);
            return Ok(ReconcileOutcome::Ignored(IgnoreReason::MissingOrderRef));
        };
        if !is_valid_order_ref(&order_ref) {
            error!(
                "🔄️ Payment {} carries external reference '{order_ref}', which is not a valid order id. Refusing \
                 to write anything for it.",
                payment.payment_id
            );
            return Ok(ReconcileOutcome::Ignored(IgnoreReason::InvalidOrderRef(order_ref)));
        }
        let order_id = OrderId(order_ref);
        let mapping = map_provider_status(&payment.status);
        if payment.currency != self.settlement_currency {
            error!(
                "🔄️ Payment {} for order {order_id} settled in {}, expected {}. Rejecting the notification.",
                payment.payment_id, payment.currency, self.settlement_currency
            );
            return Err(ReconciliationError::CurrencyMismatch {
                payment_id: payment.payment_id.clone(),
                expected: self.settlement_currency.clone(),
                actual: payment.currency.clone(),
            });
        }

        let intent = self.db.fetch_intent(&order_id).await?;
        let existing = self.db.fetch_order_by_id(&order_id).await?;

        // Statuses the mapping table maps to "no status" stop here, before amount validation: a rejected payment
        // for a never-created order must be acknowledged, not bounced for failing checks that only guard writes.
        if let ProviderStatusMapping::Unknown = mapping {
            info!("🔄️ Ignoring payment {} with unmapped provider status '{}'.", payment.payment_id, payment.status);
            return Ok(ReconcileOutcome::Ignored(IgnoreReason::UnknownProviderStatus(payment.status)));
        }
        if let ProviderStatusMapping::Failure = mapping {
            return self.apply_failed_payment(order_id, existing, payment).await;
        }

        // The quoted total is the validation baseline. If the intent has expired, the stored order total stands in;
        // if neither exists the provider amount is the only source of truth and the check is vacuous.
        let expected = intent.as_ref().and_then(|i| i.total).or_else(|| existing.as_ref().map(|o| o.total));
        if let Some(expected) = expected {
            if !expected.within_one_peso(payment.amount) {
                error!(
                    "🚨️ AMOUNT MISMATCH for order {order_id}: expected {expected}, payment {} paid {}. Refusing to \
                     create or upgrade the order. This is a suspected tampering event.",
                    payment.payment_id, payment.amount
                );
                return Err(ReconciliationError::AmountMismatch {
                    order_id,
                    expected,
                    paid: payment.amount,
                });
            }
        }

        // Payment-id dedup comes before any write. A payment that was already applied to a *different* order must
        // never be applied again. If it landed on this same order, the transition logic below decides: an identical
        // status is a true no-op, while a status progression (pending -> approved) is applied once.
        if let Some(dup) = self.db.fetch_order_by_payment_id(&payment.payment_id).await? {
            if dup.id != order_id {
                info!(
                    "🔄️ Payment {} was already applied to order {} ({}). Acknowledging without changes.",
                    payment.payment_id, dup.id, dup.status
                );
                return Ok(ReconcileOutcome::AlreadyProcessed { payment_id: payment.payment_id });
            }
        }

        match mapping {
            ProviderStatusMapping::CreateOrUpdate(status) => match existing {
                None => self.create_order(order_id, status, intent, payment).await,
                Some(order) => self.transition_order(order, status, payment).await,
            },
            ProviderStatusMapping::UpdateOnly(status) => match existing {
                None => {
                    warn!(
                        "🔄️ Payment {} reports '{}' for order {order_id}, but that order does not exist. \
                         Update-only statuses never create orders.",
                        payment.payment_id, payment.status
                    );
                    Ok(ReconcileOutcome::Ignored(IgnoreReason::UpdateForMissingOrder(order_id)))
                },
                Some(order) => self.transition_order(order, status, payment).await,
            },
            // Handled above.
            ProviderStatusMapping::Failure | ProviderStatusMapping::Unknown => unreachable!(),
        }
    }

    /// A `rejected`/`cancelled` payment. Never creates an order; a `Pending` order becomes terminal `Rejected`.
    async fn apply_failed_payment(
        &self,
        order_id: OrderId,
        existing: Option<Order>,
        payment: VerifiedPayment,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        // The quote can never be redeemed by a later replay once the payment is known to have failed.
        self.db.delete_intent(&order_id).await?;
        match existing {
            None => {
                warn!(
                    "🔄️ Payment {} for order {order_id} reported '{}'. The order was never created and stays that \
                     way.",
                    payment.payment_id, payment.status
                );
                Ok(ReconcileOutcome::Ignored(IgnoreReason::FailedPaymentWithoutOrder))
            },
            Some(order) if order.status == OrderStatusType::Rejected => {
                Ok(ReconcileOutcome::Unchanged { id: order.id, status: order.status })
            },
            Some(order) => self.transition_order(order, OrderStatusType::Rejected, payment).await,
        }
    }

    async fn create_order(
        &self,
        order_id: OrderId,
        status: OrderStatusType,
        intent: Option<crate::db_types::CheckoutIntent>,
        payment: VerifiedPayment,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        if intent.is_none() {
            info!(
                "🔄️ No checkout intent for order {order_id} (expired or never stored). Creating the order with \
                 placeholder buyer data."
            );
        }
        let intent = intent.unwrap_or_default();
        let order = NewOrder {
            id: order_id.clone(),
            user_id: intent.effective_user_id(),
            user_name: intent.user_name.clone().unwrap_or_else(|| PLACEHOLDER_BUYER_NAME.to_string()),
            user_email: intent.user_email.clone().unwrap_or_default(),
            user_phone: intent.user_phone.clone().unwrap_or_default(),
            items: intent.items.clone(),
            total: payment.amount,
            status,
            shipping_address: intent.delivery_address(),
            payment_id: payment.payment_id.clone(),
            merchant_order_id: payment.merchant_order_id.clone(),
            currency: payment.currency.clone(),
            transaction_amount: payment.amount,
            payment_status: payment.status.clone(),
            paid_at: (status == OrderStatusType::Paid).then(Utc::now),
        };
        match self.db.insert_order(order).await? {
            InsertOrderResult::Inserted(id) => {
                info!("✅️ Order {id} created with status {status} from payment {}.", payment.payment_id);
                if status == OrderStatusType::Paid {
                    if let Some(created) = self.db.fetch_order_by_id(&id).await? {
                        self.adjust_stock_for_order(&created).await;
                        self.call_order_paid_hook(&created).await;
                    }
                }
                self.db.delete_intent(&order_id).await?;
                Ok(ReconcileOutcome::OrderCreated { id, status })
            },
            InsertOrderResult::AlreadyExists(id) => {
                // Lost a race against a concurrent delivery of the same notification.
                info!("🔄️ Order {id} already exists; payment {} treated as already processed.", payment.payment_id);
                self.db.delete_intent(&order_id).await?;
                Ok(ReconcileOutcome::AlreadyProcessed { payment_id: payment.payment_id })
            },
        }
    }

    async fn transition_order(
        &self,
        order: Order,
        new_status: OrderStatusType,
        payment: VerifiedPayment,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        let order_id = order.id.clone();
        if order.status == new_status {
            debug!("🔄️ Order {order_id} already has status {new_status}. No update needed.");
            self.db.delete_intent(&order_id).await?;
            return Ok(ReconcileOutcome::Unchanged { id: order_id, status: new_status });
        }
        if !order.status.accepts_provider_transition(new_status) {
            warn!(
                "🔄️ Refusing transition {} -> {new_status} for order {order_id} (payment {}). Webhooks arrive out \
                 of order; downgrades are not applied.",
                order.status, payment.payment_id
            );
            self.db.delete_intent(&order_id).await?;
            return Ok(ReconcileOutcome::Ignored(IgnoreReason::RefusedTransition {
                id: order_id,
                from: order.status,
                to: new_status,
            }));
        }
        let newly_paid = new_status == OrderStatusType::Paid;
        let paid_at = newly_paid.then(Utc::now);
        self.db.update_order_from_payment(&order_id, new_status, &payment, paid_at).await?;
        info!("✅️ Order {order_id} updated {} -> {new_status} by payment {}.", order.status, payment.payment_id);
        if let Some(updated) = self.db.fetch_order_by_id(&order_id).await? {
            if newly_paid {
                self.adjust_stock_for_order(&updated).await;
                self.call_order_paid_hook(&updated).await;
            }
            if matches!(
                new_status,
                OrderStatusType::Rejected |
                    OrderStatusType::Refunded |
                    OrderStatusType::ChargedBack |
                    OrderStatusType::InDispute
            ) {
                self.call_order_annulled_hook(&updated, new_status).await;
            }
        }
        self.db.delete_intent(&order_id).await?;
        Ok(ReconcileOutcome::OrderUpdated { id: order_id, from: order.status, to: new_status })
    }

    /// Decrements stock for the order's line-item snapshot. Best effort: not atomic with the status write, never
    /// fatal to reconciliation. The claim flag makes a second invocation for the same order a no-op even if the
    /// transition guard were ever bypassed.
    async fn adjust_stock_for_order(&self, order: &Order) {
        if order.items.is_empty() {
            warn!("📦️ Order {} has no line items to adjust stock for.", order.id);
            return;
        }
        match self.db.mark_stock_adjusted(&order.id).await {
            Ok(true) => {},
            Ok(false) => {
                debug!("📦️ Stock for order {} was already adjusted. Skipping.", order.id);
                return;
            },
            Err(e) => {
                error!("📦️ Could not claim the stock adjustment for order {}: {e}. Skipping.", order.id);
                return;
            },
        }
        for item in &order.items {
            if item.id.is_empty() || item.quantity <= 0 {
                continue;
            }
            match self.db.product_by_id(&item.id).await {
                Ok(Some(product)) => {
                    let new_stock = (product.stock - item.quantity).max(0);
                    match self.db.set_product_stock(&item.id, new_stock).await {
                        Ok(()) => info!(
                            "📦️ Stock for product {} ({}) reduced by {} to {new_stock} for order {}.",
                            item.id, item.name, item.quantity, order.id
                        ),
                        Err(e) => {
                            error!("📦️ Failed to reduce stock for product {} on order {}: {e}", item.id, order.id)
                        },
                    }
                },
                Ok(None) => {
                    warn!("📦️ Product {} not found for stock adjustment on order {}. Skipping.", item.id, order.id)
                },
                Err(e) => error!("📦️ Could not fetch product {} for order {}: {e}", item.id, order.id),
            }
        }
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for producer in &self.producers.order_paid_producer {
            producer.publish_event(OrderPaidEvent { order: order.clone() }).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order, status: OrderStatusType) {
        for producer in &self.producers.order_annulled_producer {
            producer.publish_event(OrderAnnulledEvent { order: order.clone(), status }).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
