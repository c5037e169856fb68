use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use mercado_payment_engine::{
    events::EventProducers,
    CheckoutApi,
    ReconciliationApi,
    SqliteDatabase,
    StorefrontApi,
};
use mercado_tools::MercadoApi;

use crate::{
    config::{AdminApiKey, ServerConfig},
    errors::ServerError,
    integrations::mercado::create_storefront_event_handlers,
    intent_sweeper::start_intent_sweeper,
    mercado_routes::MercadoWebhookRoute,
    middleware::SignatureMiddlewareFactory,
    routes::{
        health,
        AllOrdersRoute,
        OrderByIdRoute,
        ProductsRoute,
        StorePendingOrderRoute,
        UpdateOrderStatusRoute,
        UserOrdersRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_storefront_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let provider =
        MercadoApi::new(config.mercado.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let _sweeper = start_intent_sweeper(db.clone());
    info!("🚀️ Intent sweeper and event handlers are live");
    let srv = create_server_instance(config, db, provider, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    provider: MercadoApi,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let reconciliation =
            ReconciliationApi::new(db.clone(), config.settlement_currency.clone(), producers.clone());
        let storefront = StorefrontApi::new(db.clone());
        let checkout = CheckoutApi::new(db.clone(), config.cache_ttl);
        let admin_key = AdminApiKey(config.admin_api_key.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mpg::access_log"))
            .app_data(web::Data::new(reconciliation))
            .app_data(web::Data::new(storefront))
            .app_data(web::Data::new(checkout))
            .app_data(web::Data::new(provider.clone()))
            .app_data(web::Data::new(admin_key));
        // The webhook lives in its own scope so the signature verifier only sees provider traffic.
        let webhook_scope = web::scope("/api/mp")
            .wrap(SignatureMiddlewareFactory::new(config.mercado.webhook_secret.clone(), config.signature_checks))
            .service(MercadoWebhookRoute::<SqliteDatabase, MercadoApi>::new());
        app.service(health)
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(UserOrdersRoute::<SqliteDatabase>::new())
            .service(AllOrdersRoute::<SqliteDatabase>::new())
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(StorePendingOrderRoute::<SqliteDatabase>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
