//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the engine's backend traits, so endpoint tests can run them against mocks. Since
//! actix cannot register generic handlers directly, the `route!` macro generates a concrete `HttpServiceFactory`
//! wrapper per handler.
use std::str::FromStr;

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use mercado_payment_engine::{
    db_types::{CheckoutIntent, OrderId, OrderStatusType},
    CatalogManagement,
    CheckoutApi,
    CheckoutIntentStore,
    OrderManagement,
    StorefrontApi,
};

use crate::{
    data_objects::{JsonResponse, OrderStatusUpdate},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires admin)  => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AdminKeyMiddlewareFactory::new());
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_by_id => Get "/api/orders/{order_id}" impl OrderManagement);
/// The buyer's polling read. A 404 is the normal response before the webhook has landed; the poller treats it as
/// "not found yet", distinct from "found but still pending".
pub async fn order_by_id<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<StorefrontApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    trace!("💻️ GET order {order_id}");
    let order = api
        .order_by_id(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} not found")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(user_orders => Get "/api/user-orders/{user_id}" impl OrderManagement);
pub async fn user_orders<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<StorefrontApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let orders = api.orders_for_user(&user_id).await?;
    debug!("💻️ {} orders fetched for user {user_id}", orders.len());
    Ok(HttpResponse::Ok().json(orders))
}

route!(all_orders => Get "/api/all-orders" impl OrderManagement where requires admin);
pub async fn all_orders<B: OrderManagement>(api: web::Data<StorefrontApi<B>>) -> Result<HttpResponse, ServerError> {
    let orders = api.all_orders().await?;
    debug!("💻️ Admin fetched all {} orders", orders.len());
    Ok(HttpResponse::Ok().json(orders))
}

route!(update_order_status => Put "/api/orders/{order_id}" impl OrderManagement where requires admin);
/// Admin override for the fulfilment statuses (`Shipped`, `Completed`) and manual corrections. Deliberately not
/// routed through the provider transition guard.
pub async fn update_order_status<B: OrderManagement>(
    path: web::Path<String>,
    body: web::Json<OrderStatusUpdate>,
    api: web::Data<StorefrontApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let update = body.into_inner();
    let status = OrderStatusType::from_str(&update.status)
        .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    let order = api.override_order_status(&order_id, status).await?;
    info!("💻️ Order {order_id} status set to {status} by admin");
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(store_pending_order => Post "/api/pending-orders/{order_id}" impl CheckoutIntentStore);
/// Called by the checkout UI just before it redirects the buyer to hosted checkout. The intent waits (bounded by
/// the TTL) for the webhook that will turn it into an order.
pub async fn store_pending_order<B: CheckoutIntentStore>(
    path: web::Path<String>,
    body: web::Json<CheckoutIntent>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    api.store_intent(&order_id, &body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Pending order stored.")))
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(products => Get "/api/products" impl CatalogManagement);
pub async fn products<B: CatalogManagement>(api: web::Data<StorefrontApi<B>>) -> Result<HttpResponse, ServerError> {
    let products = api.products().await?;
    Ok(HttpResponse::Ok().json(products))
}
