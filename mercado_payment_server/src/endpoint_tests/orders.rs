use std::time::Duration;

use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use mercado_payment_engine::{db_types::OrderStatusType, CheckoutApi, StorefrontApi};
use mpg_common::Secret;
use serde_json::json;

use crate::{
    config::AdminApiKey,
    endpoint_tests::{
        helpers::send_request,
        mocks::{sample_order, MockBackend, TEST_ORDER_ID},
    },
    routes::{AllOrdersRoute, OrderByIdRoute, StorePendingOrderRoute, UpdateOrderStatusRoute},
};

const ADMIN_KEY: &str = "test-admin-key";

#[actix_web::test]
async fn order_poll_returns_the_order_json() {
    let mut backend = MockBackend::new();
    backend.expect_order_by_id().returning(|_| Ok(Some(sample_order(OrderStatusType::Paid))));

    let app = App::new()
        .app_data(web::Data::new(StorefrontApi::new(backend)))
        .service(OrderByIdRoute::<MockBackend>::new());
    let service = test::init_service(app).await;
    let (status, body) =
        send_request(&service, TestRequest::get().uri(&format!("/api/orders/{TEST_ORDER_ID}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"Paid""#), "body: {body}");
    assert!(body.contains(TEST_ORDER_ID), "body: {body}");
}

#[actix_web::test]
async fn order_poll_is_404_before_the_webhook_lands() {
    let mut backend = MockBackend::new();
    backend.expect_order_by_id().returning(|_| Ok(None));

    let app = App::new()
        .app_data(web::Data::new(StorefrontApi::new(backend)))
        .service(OrderByIdRoute::<MockBackend>::new());
    let service = test::init_service(app).await;
    let (status, _) =
        send_request(&service, TestRequest::get().uri(&format!("/api/orders/{TEST_ORDER_ID}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_routes_require_the_api_key() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_all_orders().returning(|| Ok(vec![sample_order(OrderStatusType::Pending)]));

    let app = App::new()
        .app_data(web::Data::new(StorefrontApi::new(backend)))
        .app_data(web::Data::new(AdminApiKey(Secret::new(ADMIN_KEY.to_string()))))
        .service(AllOrdersRoute::<MockBackend>::new());
    let service = test::init_service(app).await;

    let (status, _) = send_request(&service, TestRequest::get().uri("/api/all-orders")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_request(
        &service,
        TestRequest::get().uri("/api/all-orders").insert_header(("x-api-key", "wrong-key")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_request(
        &service,
        TestRequest::get().uri("/api/all-orders").insert_header(("x-api-key", ADMIN_KEY)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(TEST_ORDER_ID), "body: {body}");
}

#[actix_web::test]
async fn an_empty_admin_key_refuses_everything() {
    let backend = MockBackend::new();
    let app = App::new()
        .app_data(web::Data::new(StorefrontApi::new(backend)))
        .app_data(web::Data::new(AdminApiKey(Secret::default())))
        .service(AllOrdersRoute::<MockBackend>::new());
    let service = test::init_service(app).await;

    let (status, _) =
        send_request(&service, TestRequest::get().uri("/api/all-orders").insert_header(("x-api-key", ""))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_status_override_updates_the_order() {
    let mut backend = MockBackend::new();
    backend.expect_order_by_id().returning(|_| Ok(Some(sample_order(OrderStatusType::Paid))));
    backend
        .expect_set_order_status()
        .withf(|_, status| *status == OrderStatusType::Shipped)
        .returning(|_, _| Ok(()));

    let app = App::new()
        .app_data(web::Data::new(StorefrontApi::new(backend)))
        .app_data(web::Data::new(AdminApiKey(Secret::new(ADMIN_KEY.to_string()))))
        .service(UpdateOrderStatusRoute::<MockBackend>::new());
    let service = test::init_service(app).await;

    let (status, _) = send_request(
        &service,
        TestRequest::put()
            .uri(&format!("/api/orders/{TEST_ORDER_ID}"))
            .insert_header(("x-api-key", ADMIN_KEY))
            .set_json(json!({ "status": "Shipped" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn an_unknown_status_string_is_a_bad_request() {
    let backend = MockBackend::new();
    let app = App::new()
        .app_data(web::Data::new(StorefrontApi::new(backend)))
        .app_data(web::Data::new(AdminApiKey(Secret::new(ADMIN_KEY.to_string()))))
        .service(UpdateOrderStatusRoute::<MockBackend>::new());
    let service = test::init_service(app).await;

    let (status, _) = send_request(
        &service,
        TestRequest::put()
            .uri(&format!("/api/orders/{TEST_ORDER_ID}"))
            .insert_header(("x-api-key", ADMIN_KEY))
            .set_json(json!({ "status": "Teleported" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn checkout_intent_is_stored_for_the_webhook() {
    let mut backend = MockBackend::new();
    backend
        .expect_put_intent()
        .withf(|order_id, intent, ttl| {
            order_id.as_str() == TEST_ORDER_ID &&
                intent.user_name.as_deref() == Some("Ana Torres") &&
                *ttl == Duration::from_secs(600)
        })
        .returning(|_, _, _| Ok(()));

    let app = App::new()
        .app_data(web::Data::new(CheckoutApi::new(backend, Duration::from_secs(600))))
        .service(StorePendingOrderRoute::<MockBackend>::new());
    let service = test::init_service(app).await;

    let (status, body) = send_request(
        &service,
        TestRequest::post().uri(&format!("/api/pending-orders/{TEST_ORDER_ID}")).set_json(json!({
            "userId": "guest",
            "userName": "Ana Torres",
            "userEmail": "ana@example.com",
            "items": [{ "id": "prod-1", "name": "Motor", "price": 1000.0, "quantity": 1 }],
            "total": 1000.0,
            "shippingAddress": "Av. Reforma 123, CDMX"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#), "body: {body}");
}
