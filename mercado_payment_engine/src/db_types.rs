use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use mpg_common::{serde_pesos, Money};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------        OrderId        -------------------------------------------------------
/// The client-generated order identifier. Doubles as the provider-side `external_reference` correlation key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
/// The closed set of order states.
///
/// `Pending` is the initial state (an order that does not exist yet is treated as pre-`Pending`). `Shipped` and
/// `Completed` are only reached through the administrative override path. The remaining states are produced by the
/// reconciliation engine from provider signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// Payment initiated but not confirmed by the provider yet.
    Pending,
    /// The provider approved the payment in full.
    Paid,
    /// Admin has dispatched the order.
    Shipped,
    /// Admin has closed the order out.
    Completed,
    /// The payment was rejected or cancelled before the order was ever paid.
    Rejected,
    /// The provider reversed the payment after approval.
    Refunded,
    /// The buyer's bank reversed the payment.
    ChargedBack,
    /// The payment is in mediation with the provider.
    InDispute,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "Pending",
            OrderStatusType::Paid => "Paid",
            OrderStatusType::Shipped => "Shipped",
            OrderStatusType::Completed => "Completed",
            OrderStatusType::Rejected => "Rejected",
            OrderStatusType::Refunded => "Refunded",
            OrderStatusType::ChargedBack => "ChargedBack",
            OrderStatusType::InDispute => "InDispute",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Shipped" => Ok(Self::Shipped),
            "Completed" => Ok(Self::Completed),
            "Rejected" => Ok(Self::Rejected),
            "Refunded" => Ok(Self::Refunded),
            "ChargedBack" => Ok(Self::ChargedBack),
            "InDispute" => Ok(Self::InDispute),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl OrderStatusType {
    /// Whether a provider-driven transition from `self` into `to` is permitted.
    ///
    /// This is the monotonicity guard: webhooks arrive in no particular order, so a late `pending` notification
    /// after an `approved` one must not regress the order. The admin override path is not routed through this check.
    pub fn accepts_provider_transition(&self, to: OrderStatusType) -> bool {
        use OrderStatusType::*;
        match (self, to) {
            (Pending, Paid) => true,
            // A rejected/cancelled payment terminates a Pending order, and nothing else.
            (Pending, Rejected) => true,
            // Post-payment reversals apply to any order that has been paid for.
            (Paid | Shipped | Completed | InDispute, Refunded | ChargedBack) => true,
            (Paid | Shipped | Completed, InDispute) => true,
            (_, _) => false,
        }
    }
}

//--------------------------------------   Provider mapping    -------------------------------------------------------
/// What a provider payment status means for the local order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatusMapping {
    /// Create the order if it does not exist, or transition it if it does.
    CreateOrUpdate(OrderStatusType),
    /// Only transition an existing order; never create one.
    UpdateOnly(OrderStatusType),
    /// The payment failed outright. Never create an order; an existing `Pending` order becomes `Rejected`.
    Failure,
    /// Not a status this engine acts on.
    Unknown,
}

/// The authoritative provider-status table.
///
/// | provider status | internal status | create/update order? |
/// |-----------------|-----------------|----------------------|
/// | approved        | Paid            | yes                  |
/// | pending         | Pending         | yes                  |
/// | in_process      | Pending         | yes                  |
/// | rejected        | —               | no                   |
/// | cancelled       | —               | no                   |
/// | refunded        | Refunded        | update only          |
/// | charged_back    | ChargedBack     | update only          |
/// | in_mediation    | InDispute       | update only          |
/// | anything else   | —               | no                   |
pub fn map_provider_status(status: &str) -> ProviderStatusMapping {
    use OrderStatusType::*;
    match status {
        "approved" => ProviderStatusMapping::CreateOrUpdate(Paid),
        "pending" | "in_process" => ProviderStatusMapping::CreateOrUpdate(Pending),
        "refunded" => ProviderStatusMapping::UpdateOnly(Refunded),
        "charged_back" => ProviderStatusMapping::UpdateOnly(ChargedBack),
        "in_mediation" => ProviderStatusMapping::UpdateOnly(InDispute),
        "rejected" | "cancelled" => ProviderStatusMapping::Failure,
        _ => ProviderStatusMapping::Unknown,
    }
}

//--------------------------------------       LineItem        -------------------------------------------------------
/// A snapshot of one purchased product at checkout time. Not a live reference into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The catalog product id, used for the stock decrement.
    pub id: String,
    pub name: String,
    #[serde(with = "serde_pesos")]
    pub price: Money,
    pub quantity: i64,
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// `None` for guest checkouts.
    pub user_id: Option<String>,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub items: Vec<LineItem>,
    #[serde(with = "serde_pesos")]
    pub total: Money,
    pub status: OrderStatusType,
    pub shipping_address: String,
    /// The provider's payment id. Unique across orders; the strongest idempotency key.
    pub payment_id: Option<String>,
    pub merchant_order_id: Option<String>,
    pub currency: Option<String>,
    #[serde(default, with = "serde_pesos::option")]
    pub transaction_amount: Option<Money>,
    /// The provider status string, verbatim, for audit.
    pub payment_status: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    /// Processed-flag guarding the inventory decrement against double application.
    pub stock_adjusted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder        -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: Option<String>,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub items: Vec<LineItem>,
    /// Set once, from the first accepted payment amount.
    pub total: Money,
    pub status: OrderStatusType,
    pub shipping_address: String,
    pub payment_id: String,
    pub merchant_order_id: Option<String>,
    pub currency: String,
    pub transaction_amount: Money,
    pub payment_status: String,
    pub paid_at: Option<DateTime<Utc>>,
}

//--------------------------------------    CheckoutIntent     -------------------------------------------------------
/// The buyer's cart and shipping data captured at checkout time, before payment is confirmed.
///
/// Ephemeral: stored with a bounded TTL, read once by the reconciliation engine, and expendable. Every field is
/// optional because expiry is a normal condition and the order is then built from placeholders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutIntent {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_phone: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// The quoted total, validated against the fetched payment amount.
    #[serde(default, with = "serde_pesos::option")]
    pub total: Option<Money>,
    #[serde(default)]
    pub delivery_method: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub pickup_location: Option<String>,
}

impl CheckoutIntent {
    /// The guest sentinel the storefront sends for unauthenticated buyers.
    pub const GUEST_USER: &'static str = "guest";

    /// The user id to persist: `None` for guests.
    pub fn effective_user_id(&self) -> Option<String> {
        self.user_id.as_deref().filter(|id| !id.is_empty() && *id != Self::GUEST_USER).map(String::from)
    }

    pub fn delivery_address(&self) -> String {
        self.shipping_address.clone().or_else(|| self.pickup_location.clone()).unwrap_or_default()
    }
}

//--------------------------------------    VerifiedPayment    -------------------------------------------------------
/// A payment record that has been re-fetched from the provider API. This is the only input the reconciliation state
/// machine accepts; data embedded in the webhook body never reaches it.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub payment_id: String,
    /// The provider's status string, kept verbatim.
    pub status: String,
    pub currency: String,
    pub amount: Money,
    /// The merchant-assigned order id, if the provider recorded one.
    pub order_ref: Option<String>,
    pub merchant_order_id: Option<String>,
}

//--------------------------------------       Product         -------------------------------------------------------
/// A catalog row. The catalog component owns these; the engine only reads them and writes the stock counter.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(with = "serde_pesos")]
    pub price: Money,
    pub stock: i64,
    pub image: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn provider_status_table() {
        use OrderStatusType::*;
        use ProviderStatusMapping::*;
        assert_eq!(map_provider_status("approved"), CreateOrUpdate(Paid));
        assert_eq!(map_provider_status("pending"), CreateOrUpdate(Pending));
        assert_eq!(map_provider_status("in_process"), CreateOrUpdate(Pending));
        assert_eq!(map_provider_status("rejected"), Failure);
        assert_eq!(map_provider_status("cancelled"), Failure);
        assert_eq!(map_provider_status("refunded"), UpdateOnly(Refunded));
        assert_eq!(map_provider_status("charged_back"), UpdateOnly(ChargedBack));
        assert_eq!(map_provider_status("in_mediation"), UpdateOnly(InDispute));
        assert_eq!(map_provider_status("authorized"), Unknown);
        assert_eq!(map_provider_status(""), Unknown);
    }

    #[test]
    fn transition_guard_refuses_downgrades() {
        use OrderStatusType::*;
        assert!(Pending.accepts_provider_transition(Paid));
        assert!(Pending.accepts_provider_transition(Rejected));
        assert!(Paid.accepts_provider_transition(Refunded));
        assert!(Paid.accepts_provider_transition(ChargedBack));
        assert!(Paid.accepts_provider_transition(InDispute));
        assert!(Shipped.accepts_provider_transition(Refunded));
        // Late pending after approved is a downgrade.
        assert!(!Paid.accepts_provider_transition(Pending));
        assert!(!Shipped.accepts_provider_transition(Pending));
        // A paid order cannot be rejected; that is what refunds are for.
        assert!(!Paid.accepts_provider_transition(Rejected));
        assert!(!Rejected.accepts_provider_transition(Paid));
    }

    #[test]
    fn guest_user_id_is_normalised() {
        let mut intent = CheckoutIntent { user_id: Some("guest".to_string()), ..Default::default() };
        assert_eq!(intent.effective_user_id(), None);
        intent.user_id = Some(String::new());
        assert_eq!(intent.effective_user_id(), None);
        intent.user_id = Some("2f1b7a24-6a1c-4f3e-8be1-0d2f8f6a9c55".to_string());
        assert!(intent.effective_user_id().is_some());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for s in
            ["Pending", "Paid", "Shipped", "Completed", "Rejected", "Refunded", "ChargedBack", "InDispute"]
        {
            assert_eq!(s.parse::<OrderStatusType>().unwrap().to_string(), s);
        }
        assert!("Pagado".parse::<OrderStatusType>().is_err());
    }
}
