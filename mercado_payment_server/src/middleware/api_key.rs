//! Shared-key guard for the admin routes.
//!
//! The admin surface (all-orders listing, order status override) is consumed by the store's own dashboard, which
//! authenticates with a shared API key in the `x-api-key` header. The expected key lives in app data
//! ([`AdminApiKey`](crate::config::AdminApiKey)); an empty configured key refuses everything rather than allowing
//! everything.

use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    web,
    Error,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::warn;

use crate::config::AdminApiKey;

pub struct AdminKeyMiddlewareFactory;

impl AdminKeyMiddlewareFactory {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        AdminKeyMiddlewareFactory
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AdminKeyMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminKeyMiddlewareService { service: Rc::new(service) })
    }
}

pub struct AdminKeyMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AdminKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let expected = req.app_data::<web::Data<AdminApiKey>>().map(|k| k.0.reveal().clone());
            let presented = req.headers().get("x-api-key").and_then(|v| v.to_str().ok());
            let authorised = match expected.as_deref() {
                None | Some("") => {
                    warn!("🛠️ Admin request refused: no admin API key is configured.");
                    false
                },
                Some(key) => presented == Some(key),
            };
            if authorised {
                service.call(req).await
            } else {
                warn!("🛠️ Admin request refused: missing or invalid x-api-key.");
                Err(ErrorUnauthorized("Unauthorized"))
            }
        })
    }
}
