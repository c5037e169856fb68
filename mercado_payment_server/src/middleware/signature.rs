//! Webhook signature verification middleware.
//!
//! Mercado Pago signs webhooks with an HMAC-SHA256 over `"{request_id}.{raw_body}"`, delivered in the
//! `x-signature` header as comma-separated `timestamp=<unix-seconds>,signature=<hex>` fields alongside an
//! `x-request-id` header.
//!
//! The HMAC must be computed over the exact bytes received. Re-serialising a parsed body and hashing that is a
//! correctness bug (whitespace and key order break the signature), so this middleware extracts the raw payload,
//! verifies it, and re-injects the untouched bytes for the handler.
//!
//! Rejections are uniform `401 Unauthorized` responses: the caller learns nothing about which check failed. The
//! details go to the server log, where a missing secret is logged as a configuration failure — silently accepting
//! unsigned webhooks when misconfigured would be a security hole, so the middleware fails closed unless signature
//! checks were explicitly disabled for a test environment.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    web,
    Error,
};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use hmac::{Hmac, Mac};
use log::{error, trace, warn};
use mpg_common::Secret;
use sha2::Sha256;

const SIGNATURE_HEADER: &str = "x-signature";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Replay-attack window. Notifications older (or newer) than this are rejected.
pub const MAX_SIGNATURE_AGE_SECS: i64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    /// No shared secret is configured. A configuration failure, not a verification failure.
    MissingSecret,
    /// The `x-signature` or `x-request-id` header is absent.
    MissingHeaders,
    /// The signature header does not parse into timestamp and hex-signature fields.
    MalformedHeader,
    /// The timestamp falls outside the replay window.
    Stale,
    /// The recomputed HMAC does not match the provided digest.
    Mismatch,
}

/// Verifies an `x-signature` header against the raw body bytes. Pure function; the middleware supplies the clock.
pub fn verify_signature(
    secret: &str,
    request_id: &str,
    raw_body: &[u8],
    signature_header: &str,
    now_epoch: i64,
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::MissingSecret);
    }
    let (timestamp, provided_hex) = parse_signature_header(signature_header)?;
    if (now_epoch - timestamp).abs() > MAX_SIGNATURE_AGE_SECS {
        return Err(SignatureError::Stale);
    }
    let provided = decode_hex(&provided_hex).ok_or(SignatureError::MalformedHeader)?;
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::MissingSecret)?;
    // The signed string is "{request_id}.{raw_body}".
    mac.update(request_id.as_bytes());
    mac.update(b".");
    mac.update(raw_body);
    // verify_slice is constant-time.
    mac.verify_slice(&provided).map_err(|_| SignatureError::Mismatch)
}

/// Parses `timestamp=<unix-seconds>,signature=<hex>`. Field order does not matter; unknown fields are ignored.
fn parse_signature_header(header: &str) -> Result<(i64, String), SignatureError> {
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim() {
            "timestamp" => timestamp = value.trim().parse::<i64>().ok(),
            "signature" => signature = Some(value.trim().to_string()),
            _ => {},
        }
    }
    match (timestamp, signature) {
        (Some(ts), Some(sig)) => Ok((ts, sig)),
        _ => Err(SignatureError::MalformedHeader),
    }
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len()).step_by(2).map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok()).collect()
}

pub struct SignatureMiddlewareFactory {
    secret: Secret<String>,
    // If false, the middleware will not check signatures and always allow the call.
    enabled: bool,
}

impl SignatureMiddlewareFactory {
    pub fn new(secret: Secret<String>, enabled: bool) -> Self {
        SignatureMiddlewareFactory { secret, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignatureMiddlewareService {
            secret: self.secret.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct SignatureMiddlewareService<S> {
    secret: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.reveal().clone();
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature");
            if !enabled {
                warn!("🔐️ Signature checks are disabled. Allowing request without verification.");
                return service.call(req).await;
            }
            let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()).map(String::from);
            let request_id = req.headers().get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()).map(String::from);
            let (Some(signature), Some(request_id)) = (signature, request_id) else {
                warn!("🔐️ Webhook request is missing its signature headers. Denying access.");
                return Err(ErrorUnauthorized("Unauthorized"));
            };
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {e:?}");
                ErrorUnauthorized("Unauthorized")
            })?;
            match verify_signature(&secret, &request_id, data.as_ref(), &signature, Utc::now().timestamp()) {
                Ok(()) => {
                    trace!("🔐️ Signature check for request {request_id} ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(SignatureError::MissingSecret) => {
                    error!(
                        "🚨️ MPG_MP_WEBHOOK_SECRET is not configured; webhooks cannot be validated. Failing closed. \
                         Set the secret, or explicitly disable signature checks in a test environment."
                    );
                    Err(ErrorUnauthorized("Unauthorized"))
                },
                Err(SignatureError::Stale) => {
                    error!("🔐️ Webhook timestamp for request {request_id} is outside the replay window. Denying.");
                    Err(ErrorUnauthorized("Unauthorized"))
                },
                Err(e) => {
                    warn!("🔐️ Invalid webhook signature for request {request_id} ({e:?}). Denying access.");
                    Err(ErrorUnauthorized("Unauthorized"))
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}

#[cfg(test)]
mod test {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const REQUEST_ID: &str = "req-77aa";
    const BODY: &[u8] = br#"{"data":{"id":"9001"},"type":"payment"}"#;

    fn sign(secret: &str, request_id: &str, body: &[u8], timestamp: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(request_id.as_bytes());
        mac.update(b".");
        mac.update(body);
        let digest = mac.finalize().into_bytes();
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        format!("timestamp={timestamp},signature={hex}")
    }

    #[test]
    fn valid_signature_is_accepted() {
        let now = 1_700_000_000;
        let header = sign(SECRET, REQUEST_ID, BODY, now);
        assert_eq!(verify_signature(SECRET, REQUEST_ID, BODY, &header, now), Ok(()));
        // A little clock skew in either direction is fine.
        assert_eq!(verify_signature(SECRET, REQUEST_ID, BODY, &header, now + 599), Ok(()));
        assert_eq!(verify_signature(SECRET, REQUEST_ID, BODY, &header, now - 599), Ok(()));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let now = 1_700_000_000;
        let header = sign(SECRET, REQUEST_ID, BODY, now);
        let tampered = br#"{"data":{"id":"9002"},"type":"payment"}"#;
        assert_eq!(verify_signature(SECRET, REQUEST_ID, tampered, &header, now), Err(SignatureError::Mismatch));
    }

    #[test]
    fn reserialised_body_breaks_the_signature() {
        // Same JSON, different whitespace. The raw bytes are what is signed.
        let now = 1_700_000_000;
        let header = sign(SECRET, REQUEST_ID, BODY, now);
        let pretty = br#"{ "data": { "id": "9001" }, "type": "payment" }"#;
        assert_eq!(verify_signature(SECRET, REQUEST_ID, pretty, &header, now), Err(SignatureError::Mismatch));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = 1_700_000_000;
        let header = sign("another-secret", REQUEST_ID, BODY, now);
        assert_eq!(verify_signature(SECRET, REQUEST_ID, BODY, &header, now), Err(SignatureError::Mismatch));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let now = 1_700_000_000;
        let header = sign(SECRET, REQUEST_ID, BODY, now);
        assert_eq!(verify_signature(SECRET, REQUEST_ID, BODY, &header, now + 601), Err(SignatureError::Stale));
        assert_eq!(verify_signature(SECRET, REQUEST_ID, BODY, &header, now - 601), Err(SignatureError::Stale));
    }

    #[test]
    fn missing_secret_is_a_distinct_failure() {
        let now = 1_700_000_000;
        let header = sign(SECRET, REQUEST_ID, BODY, now);
        assert_eq!(verify_signature("", REQUEST_ID, BODY, &header, now), Err(SignatureError::MissingSecret));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let now = 1_700_000_000;
        assert_eq!(verify_signature(SECRET, REQUEST_ID, BODY, "", now), Err(SignatureError::MalformedHeader));
        assert_eq!(
            verify_signature(SECRET, REQUEST_ID, BODY, "timestamp=1700000000", now),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            verify_signature(SECRET, REQUEST_ID, BODY, "timestamp=xyz,signature=00ff", now),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            verify_signature(SECRET, REQUEST_ID, BODY, &format!("timestamp={now},signature=zz"), now),
            Err(SignatureError::MalformedHeader)
        );
    }

    #[test]
    fn field_order_does_not_matter() {
        let now = 1_700_000_000;
        let header = sign(SECRET, REQUEST_ID, BODY, now);
        let (ts_part, sig_part) = header.split_once(',').unwrap();
        let reordered = format!("{sig_part},{ts_part}");
        assert_eq!(verify_signature(SECRET, REQUEST_ID, BODY, &reordered, now), Ok(()));
    }
}
