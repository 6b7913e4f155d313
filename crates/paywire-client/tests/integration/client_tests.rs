//! PayPalClient against the fake PayPal API.

use crate::integration::common::{FakePayPal, FakeState, fast_http_config};
use paywire_client::PayPalClient;
use paywire_core::{
    AppError, CreatePaymentOptions, ExecutePaymentOptions, Mode, PayPalConfig, PayPalErrorKind,
    PaymentDefaults, PaymentService,
};

fn defaults() -> PaymentDefaults {
    PaymentDefaults {
        currency: "USD".to_string(),
        return_url: Some("https://shop.example.com/return".to_string()),
        cancel_url: Some("https://shop.example.com/cancel".to_string()),
    }
}

#[tokio::test]
async fn test_create_payment_authenticates_and_posts_payload() {
    let fake = FakePayPal::start().await;
    let service = PaymentService::with_defaults(fake.client(), defaults());

    let payment = service
        .create_payment(&CreatePaymentOptions::new("10.00").with_description("Test order"))
        .await
        .unwrap();

    assert_eq!(payment.id, "PAY-FAKE-1");
    assert_eq!(payment.state.as_deref(), Some("created"));
    assert_eq!(payment.links.len(), 3);
    assert!(payment.create_time.is_some());
    assert!(payment.extras.contains_key("payer"));

    let state = fake.state();
    assert_eq!(state.token_requests, 1);
    assert_eq!(state.token_bodies[0], "grant_type=client_credentials");
    assert!(state.token_auth_headers[0].starts_with("Basic "));
    assert_eq!(state.bearer_tokens, vec!["token-1".to_string()]);

    let body = &state.created[0];
    assert_eq!(body["intent"], "sale");
    assert_eq!(body["payer"]["payment_method"], "paypal");
    assert_eq!(
        body["redirect_urls"]["return_url"],
        "https://shop.example.com/return"
    );
    assert_eq!(body["transactions"][0]["amount"]["total"], "10.00");
    assert_eq!(body["transactions"][0]["amount"]["currency"], "USD");
    assert_eq!(body["transactions"][0]["description"], "Test order");
    assert!(state.request_ids[0].is_some(), "POST must carry a request id");
}

#[tokio::test]
async fn test_access_token_is_cached() {
    let fake = FakePayPal::start().await;
    let client = fake.client();

    client.get_payment("PAY-1").await.unwrap();
    client.get_payment("PAY-2").await.unwrap();
    // Clones share the cached token.
    client.clone().get_payment("PAY-3").await.unwrap();

    assert_eq!(fake.state().token_requests, 1);
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_once() {
    let fake = FakePayPal::start_with(FakeState {
        expired_tokens: vec!["token-1".to_string()],
        ..Default::default()
    })
    .await;

    let payment = fake.client().get_payment("PAY-1").await.unwrap();

    assert_eq!(payment.id, "PAY-1");
    let state = fake.state();
    assert_eq!(state.token_requests, 2);
    assert_eq!(
        state.bearer_tokens,
        vec!["token-1".to_string(), "token-2".to_string()]
    );
}

#[tokio::test]
async fn test_server_error_is_retried_with_same_request_id() {
    let fake = FakePayPal::start_with(FakeState {
        create_failures: [(503, None)].into(),
        ..Default::default()
    })
    .await;
    let service = PaymentService::with_defaults(fake.client(), defaults());

    let payment = service
        .create_payment(&CreatePaymentOptions::new("3.00"))
        .await
        .unwrap();

    assert_eq!(payment.id, "PAY-FAKE-1");
    let state = fake.state();
    assert_eq!(state.request_ids.len(), 2);
    assert_eq!(state.request_ids[0], state.request_ids[1]);
    assert_eq!(state.created.len(), 1);
}

#[tokio::test]
async fn test_rate_limit_honors_retry_after() {
    let fake = FakePayPal::start_with(FakeState {
        create_failures: [(429, Some(0)), (429, None)].into(),
        ..Default::default()
    })
    .await;
    let service = PaymentService::with_defaults(fake.client(), defaults());

    service
        .create_payment(&CreatePaymentOptions::new("3.00"))
        .await
        .unwrap();

    assert_eq!(fake.state().request_ids.len(), 3);
}

#[tokio::test]
async fn test_persistent_server_error_surfaces_paypal_error() {
    let fake = FakePayPal::start_with(FakeState {
        create_failures: [(503, None), (503, None), (503, None), (503, None)].into(),
        ..Default::default()
    })
    .await;
    let service = PaymentService::with_defaults(fake.client(), defaults());

    let err = service
        .create_payment(&CreatePaymentOptions::new("3.00"))
        .await
        .unwrap_err();

    match err {
        AppError::PayPalError(details) => {
            assert_eq!(details.kind, PayPalErrorKind::ServerError);
            assert_eq!(details.name.as_deref(), Some("INTERNAL_SERVICE_ERROR"));
            assert_eq!(details.status_code, 503);
        }
        other => panic!("Expected PayPalError, got {:?}", other),
    }
    assert_eq!(
        fake.state().request_ids.len() as u32,
        fast_http_config().max_retries
    );
}

#[tokio::test]
async fn test_validation_error_is_not_retried() {
    let fake = FakePayPal::start_with(FakeState {
        create_failures: [(400, None)].into(),
        ..Default::default()
    })
    .await;
    let service = PaymentService::with_defaults(fake.client(), defaults());

    let err = service
        .create_payment(&CreatePaymentOptions::new("abc"))
        .await
        .unwrap_err();

    match err {
        AppError::PayPalError(details) => {
            assert_eq!(details.kind, PayPalErrorKind::Validation);
            assert_eq!(details.debug_id.as_deref(), Some("dbg-400"));
        }
        other => panic!("Expected PayPalError, got {:?}", other),
    }
    assert_eq!(fake.state().request_ids.len(), 1);
}

#[tokio::test]
async fn test_invalid_credentials() {
    let fake = FakePayPal::start_with(FakeState {
        reject_credentials: true,
        ..Default::default()
    })
    .await;

    let err = fake.client().get_payment("PAY-1").await.unwrap_err();

    match err {
        AppError::PayPalError(details) => {
            assert_eq!(details.kind, PayPalErrorKind::Authentication);
            assert_eq!(details.name.as_deref(), Some("invalid_client"));
            assert_eq!(details.message, "Client Authentication failed");
        }
        other => panic!("Expected PayPalError, got {:?}", other),
    }
    assert!(fake.state().bearer_tokens.is_empty());
}

#[tokio::test]
async fn test_unknown_payment_is_not_found() {
    let fake = FakePayPal::start().await;

    let err = fake.client().get_payment("PAY-MISSING").await.unwrap_err();

    match err {
        AppError::PayPalError(details) => {
            assert_eq!(details.kind, PayPalErrorKind::NotFound);
            assert_eq!(details.name.as_deref(), Some("INVALID_RESOURCE_ID"));
        }
        other => panic!("Expected PayPalError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_approve_execute_flow() {
    let fake = FakePayPal::start().await;
    let service = PaymentService::with_defaults(fake.client(), defaults());

    let created = service
        .create_payment(&CreatePaymentOptions::new("49.99"))
        .await
        .unwrap();

    let approval_url = service.approval_url(&created.id).await.unwrap();
    assert_eq!(approval_url, created.links[0].href);

    let executed = service
        .execute_payment(&ExecutePaymentOptions::new(&created.id, "PAYER-42"))
        .await
        .unwrap();
    assert_eq!(executed.state.as_deref(), Some("approved"));

    let state = fake.state();
    assert_eq!(state.executed.len(), 1);
    assert_eq!(state.executed[0].0, "PAY-FAKE-1");
    assert_eq!(state.executed[0].1["payer_id"], "PAYER-42");
    assert!(state.executed[0].1.get("transactions").is_none());
    assert_eq!(state.token_requests, 1);
}

#[tokio::test]
async fn test_execute_with_amount_sends_transaction() {
    let fake = FakePayPal::start().await;
    let service = PaymentService::with_defaults(fake.client(), defaults());

    let executed = service
        .execute_payment(&ExecutePaymentOptions::new("PAY-7", "PAYER-1").with_amount("12.00"))
        .await
        .unwrap();

    assert_eq!(executed.transactions[0].amount.total, "12.00");
    assert_eq!(
        fake.state().executed[0].1["transactions"][0]["amount"]["currency"],
        "USD"
    );
}

#[tokio::test]
async fn test_execute_already_done_is_declined() {
    let fake = FakePayPal::start().await;
    let service = PaymentService::new(fake.client());

    let err = service
        .execute_payment(&ExecutePaymentOptions::new("PAY-DONE", "PAYER-1"))
        .await
        .unwrap_err();

    match err {
        AppError::PayPalError(details) => {
            assert_eq!(details.kind, PayPalErrorKind::PaymentDeclined);
            assert!(!AppError::PayPalError(details).is_retryable());
        }
        other => panic!("Expected PayPalError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_approval_url_without_links() {
    let fake = FakePayPal::start().await;
    let service = PaymentService::new(fake.client());

    let err = service.approval_url("PAY-NOLINKS").await.unwrap_err();

    assert!(matches!(err, AppError::MissingApprovalUrl(id) if id == "PAY-NOLINKS"));
}

#[tokio::test]
async fn test_missing_field_never_reaches_paypal() {
    let fake = FakePayPal::start().await;
    let service = PaymentService::with_defaults(fake.client(), defaults());

    let err = service
        .execute_payment(&ExecutePaymentOptions::new("PAY-1", ""))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::MissingField("payer_id")));
    let state = fake.state();
    assert_eq!(state.token_requests, 0);
    assert!(state.bearer_tokens.is_empty());
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let config =
        PayPalConfig::new(Mode::Sandbox, "id", "secret").with_api_base("http://127.0.0.1:1");
    let client = PayPalClient::with_http_config(&config, fast_http_config()).unwrap();

    let err = client.get_payment("PAY-1").await.unwrap_err();

    assert!(
        matches!(err, AppError::NetworkError(_)),
        "Expected NetworkError, got {:?}",
        err
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_token_refresh_does_not_use_up_server_error_retries() {
    let fake = FakePayPal::start_with(FakeState {
        expired_tokens: vec!["token-1".to_string()],
        create_failures: [(503, None), (503, None)].into(),
        ..Default::default()
    })
    .await;
    let service = PaymentService::with_defaults(fake.client(), defaults());

    let payment = service
        .create_payment(&CreatePaymentOptions::new("8.00"))
        .await
        .unwrap();

    assert_eq!(payment.id, "PAY-FAKE-1");
    let state = fake.state();
    assert_eq!(state.token_requests, 2);
    // Requests past the bearer check: two 503s, then the success.
    assert_eq!(
        state.request_ids.len() as u32,
        fast_http_config().max_retries
    );
    assert!(state.request_ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(state.created.len(), 1);
}

#[tokio::test]
async fn test_create_without_redirect_urls_surfaces_paypal_rejection() {
    let fake = FakePayPal::start().await;
    let service = PaymentService::new(fake.client());

    let err = service
        .create_payment(&CreatePaymentOptions::new("10.00"))
        .await
        .unwrap_err();

    match err {
        AppError::PayPalError(details) => {
            assert_eq!(details.kind, PayPalErrorKind::Validation);
            assert_eq!(details.name.as_deref(), Some("VALIDATION_ERROR"));
        }
        other => panic!("Expected PayPalError, got {:?}", other),
    }
    let state = fake.state();
    assert_eq!(state.request_ids.len(), 1);
    assert!(state.created.is_empty());
}
