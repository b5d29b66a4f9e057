mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use paypal_ipn_core::create_app;
use paypal_ipn_core::ports::{OrderRepository, TransactionRepository};
use tower::ServiceExt;

fn ipn_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/paypal/ipn")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn health_request() -> Request<Body> {
    Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_repeated_postback_failures_open_the_circuit() {
    let mut server = mockito::Server::new_async().await;
    // threshold is 3 in the shared test state; the fourth call never leaves the process
    let mock = server
        .mock("POST", WEBSCR)
        .with_status(503)
        .expect(3)
        .create_async()
        .await;
    let (state, store) = app_state(&server.url());
    let order = order("ORD-CB-1");
    store.save(&order).await.unwrap();
    let body = urlencode(&signed_notification(&order, "Completed"));

    for _ in 0..4 {
        let response = create_app(state.clone())
            .oneshot(ipn_request(body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    assert_eq!(state.paypal_client.circuit_state(), "open");
    assert!(store.list_for_order("ORD-CB-1").await.unwrap().is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_health_reports_degraded_while_circuit_is_open() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", WEBSCR)
        .with_status(500)
        .create_async()
        .await;
    let (state, store) = app_state(&server.url());
    let order = order("ORD-CB-2");
    store.save(&order).await.unwrap();
    let body = urlencode(&signed_notification(&order, "Completed"));

    let healthy = create_app(state.clone())
        .oneshot(health_request())
        .await
        .unwrap();
    assert_eq!(healthy.status(), StatusCode::OK);

    for _ in 0..3 {
        let _ = create_app(state.clone())
            .oneshot(ipn_request(body.clone()))
            .await
            .unwrap();
    }

    let degraded = create_app(state).oneshot(health_request()).await.unwrap();
    assert_eq!(degraded.status(), StatusCode::SERVICE_UNAVAILABLE);
}
