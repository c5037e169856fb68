//----------------------------------------------   Webhook  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error, info, trace, warn};
use mercado_payment_engine::{PaymentGatewayDatabase, ReconciliationApi, ReconciliationError};
use mercado_tools::{MercadoApiError, PaymentProvider};
use serde_json::Value;

use crate::{
    data_objects::{JsonResponse, WebhookParams},
    integrations::mercado::verified_payment_from_record,
    route,
};

route!(mercado_webhook => Post "/webhook" impl PaymentGatewayDatabase, PaymentProvider);
/// The reconciliation webhook.
///
/// The signature middleware has already authenticated the request and the raw body reaches this handler untouched.
/// The body and query string are used for routing only — payment id and topic — and never as a source of truth:
/// the payment record is re-fetched from the provider before anything is written.
///
/// Response statuses drive the provider's retry behaviour: 200 means "do not redeliver" (processed, not
/// applicable, or not worth retrying), 400 means the notification is malformed or failed an integrity check, and
/// 5xx explicitly requests a retry after a transient storage failure.
pub async fn mercado_webhook<B, P>(
    req: HttpRequest,
    query: web::Query<WebhookParams>,
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B>>,
    provider: web::Data<P>,
) -> HttpResponse
where
    B: PaymentGatewayDatabase,
    P: PaymentProvider,
{
    let request_id =
        req.headers().get("x-request-id").and_then(|v| v.to_str().ok()).unwrap_or("unknown").to_string();
    trace!("🔔️ Received webhook request {request_id}: {}", req.uri());
    let body_json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let query = query.into_inner();
    let payment_id = query
        .data_id
        .clone()
        .or_else(|| query.id.clone())
        .or_else(|| body_json.pointer("/data/id").and_then(json_id));
    let topic = query
        .topic
        .clone()
        .or_else(|| query.kind.clone())
        .or_else(|| body_json.get("type").and_then(Value::as_str).map(String::from))
        .or_else(|| body_json.get("topic").and_then(Value::as_str).map(String::from));
    debug!("🔔️ Webhook data extracted ({request_id}): payment_id={payment_id:?} topic={topic:?}");

    let Some(payment_id) = payment_id else {
        warn!("🔔️ No payment id found in webhook {request_id}. Nothing to process.");
        return HttpResponse::BadRequest().json(JsonResponse::failure("No payment id in notification."));
    };

    if let Some(topic) = topic {
        if topic != "payment" && topic != "merchant_order" {
            info!("🔔️ Ignoring webhook {request_id} with topic '{topic}'.");
            return HttpResponse::Ok().json(JsonResponse::success(format!("Topic {topic} ignored.")));
        }
    }

    // The webhook body is never trusted for amounts or status. Fetch the canonical record.
    let payment = match provider.payment_by_id(&payment_id).await {
        Ok(payment) => payment,
        Err(MercadoApiError::PaymentNotFound(id)) => {
            info!("🔔️ Payment {id} is not queryable ({request_id}). Acknowledging; nothing to do.");
            return HttpResponse::Ok().json(JsonResponse::success("Payment not found."));
        },
        Err(e) => {
            // Acknowledge so the provider does not retry-storm an endpoint whose root cause is upstream; this
            // notification needs manual follow-up instead.
            error!(
                "🚨️ Failed to fetch payment {payment_id} after retries ({request_id}): {e}. Acknowledging and \
                 flagging for manual reconciliation."
            );
            return HttpResponse::Ok().json(JsonResponse::failure("Payment could not be fetched."));
        },
    };

    let verified = verified_payment_from_record(&payment);
    match api.process_payment(verified).await {
        Ok(outcome) => {
            info!("🔔️ Webhook {request_id} for payment {payment_id} processed: {outcome:?}");
            HttpResponse::Ok().json(JsonResponse::success("Webhook processed."))
        },
        Err(e @ ReconciliationError::CurrencyMismatch { .. }) => {
            error!("🔔️ Webhook {request_id} rejected: {e}");
            HttpResponse::BadRequest().json(JsonResponse::failure(e))
        },
        Err(e @ ReconciliationError::AmountMismatch { .. }) => {
            error!("🔔️ Webhook {request_id} rejected: {e}");
            HttpResponse::BadRequest().json(JsonResponse::failure(e))
        },
        Err(ReconciliationError::DatabaseError(e)) => {
            // 5xx: nothing durable was written, so the provider should retry. Idempotency makes that safe.
            error!("🔔️ Storage failure while processing webhook {request_id}: {e}. Requesting provider retry.");
            HttpResponse::InternalServerError().json(JsonResponse::failure("Transient storage failure."))
        },
    }
}

/// Payment ids arrive as strings in query parameters but may be JSON numbers in the body.
fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
