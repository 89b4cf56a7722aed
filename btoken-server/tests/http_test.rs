use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use btoken::{MemoryTokenStore, StaticAuthorizer, TokenService};
use btoken_server::{router, AppState};

const USER: &str = "jtkirk";
const PASSWORD: &str = "Beam me up, Scotty!";

/// Bind the app to an ephemeral port and return its base URL.
async fn spawn_server() -> String {
    let mut users = HashMap::new();
    users.insert(USER.to_string(), PASSWORD.to_string());
    let service = Arc::new(TokenService::new(
        Arc::new(MemoryTokenStore::new()),
        Arc::new(StaticAuthorizer::new(users)),
        Duration::from_secs(3600),
    ));

    let app = router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn issue_and_verify_round_trip() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let authorization: Value = client
        .post(format!("{base}/authorizations"))
        .basic_auth(USER, Some(PASSWORD))
        .json(&json!({
            "user": USER,
            "scopes": ["enterprise", "shuttlecraft"],
            "duration": "30m"
        }))
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap()
        .json()
        .await
        .unwrap();

    let token = authorization["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert_eq!(authorization["user"], USER);
    assert_eq!(
        authorization["scopes"],
        json!({"enterprise": true, "shuttlecraft": true})
    );

    let verify = |user: &str, scope: Option<&str>| {
        let client = client.clone();
        let base = base.clone();
        let token = token.to_string();
        let user = user.to_string();
        let scope = scope.map(str::to_string);
        async move {
            let response: Value = client
                .post(format!("{base}/authorizations/verify"))
                .json(&json!({"token": token, "user": user, "scope": scope}))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            response["valid"].as_bool().unwrap()
        }
    };

    assert!(verify(USER, Some("enterprise")).await);
    assert!(verify(USER, None).await);
    assert!(!verify(USER, Some("phaser")).await);
    assert!(!verify("mrspock", Some("enterprise")).await);
}

#[tokio::test]
async fn empty_body_issues_default_authorization() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let authorization: Value = client
        .post(format!("{base}/authorizations"))
        .basic_auth(USER, Some(PASSWORD))
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap()
        .json()
        .await
        .unwrap();

    // The user is filled from the authenticated identity.
    assert_eq!(authorization["user"], USER);
    assert_eq!(authorization["scopes"], json!({}));
}

#[tokio::test]
async fn missing_header_is_bad_request() {
    let base = spawn_server().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/authorizations"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await.unwrap(), "Malformed Authorization header");
}

#[tokio::test]
async fn non_basic_scheme_is_bad_request() {
    let base = spawn_server().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/authorizations"))
        .header("Authorization", "Bearer something")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let base = spawn_server().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/authorizations"))
        .basic_auth(USER, Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn garbage_body_is_bad_request() {
    let base = spawn_server().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/authorizations"))
        .basic_auth(USER, Some(PASSWORD))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await.unwrap(), "Missing or bad request body");
}

#[tokio::test]
async fn unknown_token_verifies_as_invalid() {
    let base = spawn_server().await;
    let response: Value = reqwest::Client::new()
        .post(format!("{base}/authorizations/verify"))
        .json(&json!({"token": "nonexistent", "user": USER}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["valid"], false);
}

#[tokio::test]
async fn healthz_responds() {
    let base = spawn_server().await;
    let response: Value = reqwest::Client::new()
        .get(format!("{base}/healthz"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["ok"], true);
}
