//! Integration tests for authentication and discovery against a mock Azure

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use amrscan_core::config::{Config, Overrides, Settings};
use amrscan_core::discovery;
use amrscan_core::model::AMR_RESOURCE_FILTER;
use amrscan_core::{CoreError, ScanOutcome};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT: &str = "tenant-123";

fn settings_for(server: &MockServer, filter: Option<Vec<&str>>) -> Settings {
    let config = Config {
        tenant_id: Some(TENANT.to_string()),
        client_id: Some("client-abc".to_string()),
        client_secret: Some("s3cret".to_string()),
        subscription_filter: filter.map(|ids| ids.into_iter().map(str::to_string).collect()),
        max_workers: Some(2),
        authority_host: Some(server.uri()),
        management_endpoint: Some(server.uri()),
        timeout_secs: Some(5),
    };
    Settings::resolve(config, |_| None, Overrides::default()).unwrap()
}

async fn mock_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/v2.0/token", TENANT)))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "test-token"
        })))
        .mount(server)
        .await;
}

async fn mock_subscriptions(server: &MockServer, subscriptions: Value) {
    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .and(query_param("api-version", "2022-12-01"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": subscriptions })))
        .mount(server)
        .await;
}

fn amr_resource(sub: &str, rg: &str, name: &str, state: &str) -> Value {
    json!({
        "id": format!("/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Cache/redisEnterprise/{name}"),
        "name": name,
        "type": "Microsoft.Cache/redisEnterprise",
        "location": "eastus",
        "tags": { "team": "cache" },
        "provisioningState": state,
        "createdTime": "2024-03-01T08:00:00Z"
    })
}

async fn mock_resources(server: &MockServer, sub: &str, resources: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{}/resources", sub)))
        .and(query_param("$filter", AMR_RESOURCE_FILTER))
        .and(query_param("api-version", "2021-04-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": resources })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_discover_collects_in_subscription_order() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    mock_subscriptions(
        &server,
        json!([
            { "subscriptionId": "sub-a", "displayName": "Alpha", "state": "Enabled" },
            { "subscriptionId": "sub-b", "displayName": "Beta", "state": "Enabled" },
            { "subscriptionId": "sub-c", "displayName": "Gamma", "state": "Warned" }
        ]),
    )
    .await;
    mock_resources(
        &server,
        "sub-a",
        json!([
            amr_resource("sub-a", "rg1", "cache-1", "Succeeded"),
            amr_resource("sub-a", "rg2", "cache-2", "Failed")
        ]),
    )
    .await;
    mock_resources(&server, "sub-b", json!([])).await;
    mock_resources(
        &server,
        "sub-c",
        json!([amr_resource("sub-c", "rg3", "cache-3", "Succeeded")]),
    )
    .await;

    let run = discovery::discover(&settings_for(&server, None)).await.unwrap();

    assert_eq!(run.outcomes.len(), 3);
    let ids: Vec<&str> = run.outcomes.iter().map(|o| o.subscription().id.as_str()).collect();
    assert_eq!(ids, vec!["sub-a", "sub-b", "sub-c"]);

    let resources = run.resources();
    assert_eq!(resources.len(), 3);
    assert_eq!(resources[0].resource_group, "rg1");
    assert_eq!(resources[0].subscription_name, "Alpha");
    assert_eq!(resources[0].provisioning_state.as_deref(), Some("Succeeded"));
    assert_eq!(resources[0].created_date.as_deref(), Some("2024-03-01T08:00:00Z"));
    assert_eq!(resources[0].tags.get("team").map(String::as_str), Some("cache"));
    assert_eq!(resources[2].resource_name, "cache-3");
    assert_eq!(run.failures().count(), 0);
}

#[tokio::test]
async fn test_one_failing_subscription_does_not_abort() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    mock_subscriptions(
        &server,
        json!([
            { "subscriptionId": "sub-a", "displayName": "Alpha" },
            { "subscriptionId": "sub-broken", "displayName": "Broken" },
            { "subscriptionId": "sub-c", "displayName": "Gamma" }
        ]),
    )
    .await;
    mock_resources(
        &server,
        "sub-a",
        json!([amr_resource("sub-a", "rg", "a1", "Succeeded")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub-broken/resources"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": "AuthorizationFailed", "message": "no read access" }
        })))
        .mount(&server)
        .await;
    mock_resources(
        &server,
        "sub-c",
        json!([amr_resource("sub-c", "rg", "c1", "Succeeded")]),
    )
    .await;

    let run = discovery::discover(&settings_for(&server, None)).await.unwrap();

    let failures: Vec<&ScanOutcome> = run.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].subscription().id, "sub-broken");
    match failures[0] {
        ScanOutcome::Failed { reason, .. } => assert!(reason.contains("AuthorizationFailed")),
        other => panic!("expected failure, got {:?}", other),
    }

    let names: Vec<String> = run.resources().into_iter().map(|r| r.resource_name).collect();
    assert_eq!(names, vec!["a1".to_string(), "c1".to_string()]);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_failing_subscription_logged_exactly_once() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = MockServer::start().await;
    mock_token(&server).await;
    mock_subscriptions(
        &server,
        json!([
            { "subscriptionId": "sub-a", "displayName": "Alpha" },
            { "subscriptionId": "sub-broken", "displayName": "Broken" }
        ]),
    )
    .await;
    mock_resources(&server, "sub-a", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub-broken/resources"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let run = discovery::discover(&settings_for(&server, None)).await.unwrap();
    assert_eq!(run.failures().count(), 1);

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    let mentions: Vec<&str> = output.lines().filter(|l| l.contains("sub-broken")).collect();
    assert_eq!(mentions.len(), 1, "{:?}", mentions);
    assert!(mentions[0].contains("Broken"));
    assert!(mentions[0].contains("backend unavailable"));
    assert!(!output.contains("sub-a"));
}

#[tokio::test]
async fn test_subscription_and_resource_pagination() {
    let server = MockServer::start().await;
    mock_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .and(query_param_is_missing("$skiptoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "subscriptionId": "sub-a", "displayName": "Alpha" }],
            "nextLink": format!("{}/subscriptions?api-version=2022-12-01&$skiptoken=p2", server.uri())
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .and(query_param("$skiptoken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "subscriptionId": "sub-b", "displayName": "Beta" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/subscriptions/sub-a/resources"))
        .and(query_param_is_missing("$skiptoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [amr_resource("sub-a", "rg", "a1", "Succeeded")],
            "nextLink": format!("{}/subscriptions/sub-a/resources?api-version=2021-04-01&$skiptoken=r2", server.uri())
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub-a/resources"))
        .and(query_param("$skiptoken", "r2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [amr_resource("sub-a", "rg", "a2", "Succeeded")],
            "nextLink": null
        })))
        .mount(&server)
        .await;
    mock_resources(&server, "sub-b", json!([])).await;

    let run = discovery::discover(&settings_for(&server, None)).await.unwrap();

    assert_eq!(run.subscriptions.len(), 2);
    let names: Vec<String> = run.resources().into_iter().map(|r| r.resource_name).collect();
    assert_eq!(names, vec!["a1".to_string(), "a2".to_string()]);
}

#[tokio::test]
async fn test_allow_list_limits_scanned_subscriptions() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    mock_subscriptions(
        &server,
        json!([
            { "subscriptionId": "sub-a", "displayName": "Alpha" },
            { "subscriptionId": "sub-b", "displayName": "Beta" }
        ]),
    )
    .await;
    mock_resources(
        &server,
        "sub-b",
        json!([amr_resource("sub-b", "rg", "b1", "Succeeded")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub-a/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let run = discovery::discover(&settings_for(&server, Some(vec!["sub-b"])))
        .await
        .unwrap();

    assert_eq!(run.subscriptions.len(), 1);
    assert!(run.resources().iter().all(|r| r.subscription_id == "sub-b"));
}

#[tokio::test]
async fn test_rejected_secret_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/v2.0/token", TENANT)))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        })))
        .mount(&server)
        .await;

    let err = discovery::discover(&settings_for(&server, None))
        .await
        .unwrap_err();

    match err {
        CoreError::Authentication { message } => assert!(message.contains("AADSTS7000215")),
        other => panic!("expected authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_secret_makes_no_requests() {
    let server = MockServer::start().await;
    let mut settings = settings_for(&server, None);
    settings.client_secret = None;

    let err = discovery::discover(&settings).await.unwrap_err();

    assert!(matches!(err, CoreError::MissingCredential { .. }));
    let received = server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_subscription_list_failure_is_fatal() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = discovery::discover(&settings_for(&server, None))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::SubscriptionList(ref msg) if msg.contains("500")));
}

#[tokio::test]
async fn test_no_visible_subscriptions_is_fatal() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    mock_subscriptions(&server, json!([])).await;

    let err = discovery::discover(&settings_for(&server, None))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::NoSubscriptions));
}
