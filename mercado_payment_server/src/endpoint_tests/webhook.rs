use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use mercado_payment_engine::{
    db_types::{CheckoutIntent, OrderStatusType},
    events::EventProducers,
    InsertOrderResult,
    PaymentGatewayError,
    ReconciliationApi,
};
use mercado_tools::MercadoApiError;
use mockall::Sequence;
use mpg_common::Money;

use crate::{
    endpoint_tests::{
        helpers::send_request,
        mocks::{sample_order, sample_payment_record, MockBackend, MockProvider, TEST_ORDER_ID},
    },
    mercado_routes::MercadoWebhookRoute,
};

async fn webhook_call(backend: MockBackend, provider: MockProvider, uri: &str) -> (StatusCode, String) {
    let api = ReconciliationApi::new(backend, "MXN".to_string(), EventProducers::default());
    let app = App::new()
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(provider))
        .service(MercadoWebhookRoute::<MockBackend, MockProvider>::new());
    let service = test::init_service(app).await;
    send_request(&service, TestRequest::post().uri(uri)).await
}

#[actix_web::test]
async fn approved_payment_creates_the_order() {
    let mut provider = MockProvider::new();
    provider.expect_payment_by_id().returning(|_| Ok(sample_payment_record("approved", 1000.0, "MXN")));

    let mut backend = MockBackend::new();
    backend.expect_fetch_intent().returning(|_| Ok(None));
    let mut seq = Sequence::new();
    backend.expect_fetch_order_by_id().times(1).in_sequence(&mut seq).returning(|_| Ok(None));
    backend.expect_fetch_order_by_payment_id().returning(|_| Ok(None));
    backend
        .expect_insert_order()
        .withf(|order| order.id.as_str() == TEST_ORDER_ID && order.status == OrderStatusType::Paid)
        .returning(|order| Ok(InsertOrderResult::Inserted(order.id)));
    backend
        .expect_fetch_order_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Some(sample_order(OrderStatusType::Paid))));
    backend.expect_delete_intent().times(1).returning(|_| Ok(()));

    let (status, body) = webhook_call(backend, provider, "/webhook?data.id=555&type=payment").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#), "body: {body}");
}

#[actix_web::test]
async fn missing_payment_id_is_malformed() {
    let (status, _) = webhook_call(MockBackend::new(), MockProvider::new(), "/webhook").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unrelated_topics_are_acknowledged_without_processing() {
    // No provider expectations: a fetch would panic the mock.
    let (status, body) =
        webhook_call(MockBackend::new(), MockProvider::new(), "/webhook?data.id=555&type=subscription").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ignored"), "body: {body}");
}

#[actix_web::test]
async fn unqueryable_payment_is_acknowledged() {
    let mut provider = MockProvider::new();
    provider.expect_payment_by_id().returning(|id| Err(MercadoApiError::PaymentNotFound(id.to_string())));

    let (status, _) = webhook_call(MockBackend::new(), provider, "/webhook?data.id=555&topic=payment").await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn exhausted_fetch_retries_are_acknowledged_for_manual_review() {
    let mut provider = MockProvider::new();
    provider
        .expect_payment_by_id()
        .returning(|_| Err(MercadoApiError::UpstreamError { status: 503, message: "unavailable".to_string() }));

    let (status, body) = webhook_call(MockBackend::new(), provider, "/webhook?data.id=555&topic=payment").await;
    // 200 on purpose: retrying against a broken upstream only creates a retry storm.
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":false"#), "body: {body}");
}

#[actix_web::test]
async fn currency_mismatch_is_rejected() {
    let mut provider = MockProvider::new();
    provider.expect_payment_by_id().returning(|_| Ok(sample_payment_record("approved", 1000.0, "USD")));

    // No backend expectations: the currency gate fires before any storage access.
    let (status, _) = webhook_call(MockBackend::new(), provider, "/webhook?data.id=555&type=payment").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn amount_mismatch_is_rejected_without_writes() {
    let mut provider = MockProvider::new();
    provider.expect_payment_by_id().returning(|_| Ok(sample_payment_record("approved", 500.0, "MXN")));

    let mut backend = MockBackend::new();
    backend.expect_fetch_intent().returning(|_| {
        Ok(Some(CheckoutIntent { total: Some(Money::from_pesos(1000)), ..Default::default() }))
    });
    backend.expect_fetch_order_by_id().returning(|_| Ok(None));
    // No insert expectation: a write would panic the mock.

    let (status, _) = webhook_call(backend, provider, "/webhook?data.id=555&type=payment").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn storage_failure_requests_a_provider_retry() {
    let mut provider = MockProvider::new();
    provider.expect_payment_by_id().returning(|_| Ok(sample_payment_record("approved", 1000.0, "MXN")));

    let mut backend = MockBackend::new();
    backend.expect_fetch_intent().returning(|_| Ok(None));
    backend.expect_fetch_order_by_id().returning(|_| Ok(None));
    backend.expect_fetch_order_by_payment_id().returning(|_| Ok(None));
    backend
        .expect_insert_order()
        .returning(|_| Err(PaymentGatewayError::DatabaseError("disk I/O error".to_string())));

    let (status, _) = webhook_call(backend, provider, "/webhook?data.id=555&type=payment").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
