/*
[INPUT]:  Mock HTTP responses from the wallet-auth service
[OUTPUT]: Test results for the HTTP identity provider
[POS]:    Integration tests - provider endpoints and gateway over HTTP
[UPDATE]: When provider endpoints or payloads change
*/

mod common;

use std::sync::Arc;

use common::{ScriptedDataLayer, TEST_CLIENT_ID, fast_gateway_config, setup_mock_server};
use serde_json::json;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zero2hero_rewards::retry::no_backoff;
use zero2hero_rewards::{
    AuthGateway, AuthStatus, GatewayConfig, HttpIdentityProvider, IdentityProvider, LoginFailure,
    MemorySessionCache, ProviderConfig, RetryPolicy, RewardsError, SessionStore,
};

fn provider_for(server: &MockServer) -> HttpIdentityProvider {
    let config = ProviderConfig {
        client_id: TEST_CLIENT_ID.to_string(),
        base_url: server.uri(),
        timeout_secs: 5,
        ..ProviderConfig::default()
    };
    assert_ok!(HttpIdentityProvider::new(config))
}

#[tokio::test]
async fn initialize_sends_project_settings() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/sdk/init"))
        .and(body_partial_json(json!({
            "client_id": TEST_CLIENT_ID,
            "network": "sapphire_devnet",
            "chain_id": "0x1",
            "rpc_target": "https://ethereum.publicnode.com",
            "session_time": 86400,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    assert_ok!(provider.initialize().await);
    assert!(!provider.is_connected().await);
}

#[tokio::test]
async fn restored_session_token_is_used_for_user_info() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/sdk/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_token": "restored-token",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/sdk/user"))
        .and(header("authorization", "Bearer restored-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "a@x.com",
            "name": "Ann",
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    assert_ok!(provider.initialize().await);
    assert!(provider.is_connected().await);

    let identity = assert_ok!(provider.current_user().await);
    assert_eq!(identity.verified_email(), Some("a@x.com"));
    assert_eq!(identity.display_name(), "Ann");
}

#[tokio::test]
async fn connect_and_logout_manage_the_session_token() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/sdk/connect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_token": "fresh-token",
            "user": { "email": "a@x.com" },
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sdk/logout"))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let identity = assert_ok!(provider.connect().await);
    assert_eq!(identity.verified_email(), Some("a@x.com"));
    assert_eq!(identity.name, None);
    assert_eq!(provider.tokens().get_token(), Some("fresh-token".to_string()));

    assert_ok!(provider.disconnect().await);
    assert!(!provider.is_connected().await);

    // Second logout has nothing to tear down and makes no request
    assert_ok!(provider.disconnect().await);
}

#[tokio::test]
async fn error_responses_carry_the_service_message() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/sdk/connect"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid API key",
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    match provider.connect().await {
        Err(RewardsError::Provider(message)) => {
            assert!(message.contains("401"));
            assert!(message.contains("Invalid API key"));
            assert_eq!(
                LoginFailure::classify(&message),
                LoginFailure::ServiceUnavailable
            );
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

fn http_gateway(server: &MockServer) -> (AuthGateway, SessionStore) {
    let store = SessionStore::new(Arc::new(MemorySessionCache::new()));
    let config = GatewayConfig {
        init_policy: RetryPolicy::new(3, no_backoff),
        ..fast_gateway_config()
    };
    let gateway = AuthGateway::new(
        Arc::new(provider_for(server)),
        Arc::new(ScriptedDataLayer::new()),
        store.clone(),
        config,
    );
    (gateway, store)
}

#[tokio::test]
async fn gateway_over_http_fails_after_three_init_attempts() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/sdk/init"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "failed to fetch project configurations",
        })))
        .expect(3)
        .mount(&server)
        .await;

    let (gateway, store) = http_gateway(&server);
    let err = gateway
        .initialize(&CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        RewardsError::Initialization { attempts, message } => {
            assert_eq!(attempts, 3);
            assert!(message.contains("failed to fetch project configurations"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.snapshot().status, AuthStatus::Failed);
}

#[tokio::test]
async fn gateway_over_http_classifies_rejected_login() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/sdk/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sdk/connect"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "user rejected the login request",
        })))
        .mount(&server)
        .await;

    let (gateway, store) = http_gateway(&server);
    assert_ok!(gateway.initialize(&CancellationToken::new()).await);

    let err = gateway.connect().await.unwrap_err();
    assert!(matches!(err, RewardsError::Login(LoginFailure::Cancelled)));
    assert_eq!(err.user_message(), "Login was cancelled by user.");
    assert!(store.snapshot().identity.is_none());
}
