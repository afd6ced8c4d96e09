//! Integration tests for the grant engines: authorization code exchange
//! (with PKCE), refresh token rotation, and expiry handling.

mod common;

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use common::{
    MockModel, basic_auth, code_record, confidential_client, form_post, refresh_token_record,
};
use oauth2_engine::types::CodeChallengeMethod;
use oauth2_engine::{OAuth2Server, Response, ServerOptions};

const CODE_GRANTS: &[&str] = &["authorization_code", "refresh_token"];

fn code_exchange_request(code: &str) -> oauth2_engine::Request {
    form_post()
        .with_header("Authorization", basic_auth("app", "s3cret"))
        .with_body_param("grant_type", "authorization_code")
        .with_body_param("code", code)
}

// ─── Authorization code exchange ─────────────────────────────────────────────

#[tokio::test]
async fn test_code_exchange_issues_tokens_and_consumes_code() {
    common::init_tracing();
    let model = MockModel::new()
        .with_client(confidential_client("app", CODE_GRANTS), Some("s3cret"))
        .with_code(code_record("the-code", &confidential_client("app", CODE_GRANTS), 300));
    let model = Arc::new(model);
    let server = OAuth2Server::new(Arc::clone(&model));

    let mut response = Response::new();
    let token =
        server.token(&code_exchange_request("the-code"), &mut response, None).await.unwrap();

    assert_eq!(token.authorization_code.as_deref(), Some("the-code"));
    assert!(token.refresh_token.is_some());
    assert!(!model.code_exists("the-code"));

    // The code is single-use: a second exchange must fail.
    let mut replay = Response::new();
    let err =
        server.token(&code_exchange_request("the-code"), &mut replay, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid grant: authorization code is invalid");
}

#[tokio::test]
async fn test_code_issued_to_another_client_is_invalid() {
    let other = confidential_client("someone-else", CODE_GRANTS);
    let model = MockModel::new()
        .with_client(confidential_client("app", CODE_GRANTS), Some("s3cret"))
        .with_code(code_record("stolen", &other, 300));
    let server = OAuth2Server::new(Arc::new(model));

    let mut response = Response::new();
    let err = server.token(&code_exchange_request("stolen"), &mut response, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid grant: authorization code is invalid");
}

#[tokio::test]
async fn test_expired_code_is_rejected() {
    let client = confidential_client("app", CODE_GRANTS);
    let model = MockModel::new()
        .with_client(client.clone(), Some("s3cret"))
        .with_code(code_record("stale", &client, -1));
    let server = OAuth2Server::new(Arc::new(model));

    let mut response = Response::new();
    let err = server.token(&code_exchange_request("stale"), &mut response, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid grant: authorization code has expired");
}

#[tokio::test]
async fn test_bound_redirect_uri_must_match_exactly() {
    let client = confidential_client("app", CODE_GRANTS);
    let mut code = code_record("bound", &client, 300);
    code.redirect_uri = Some("https://example.com/cb".into());
    let model = MockModel::new().with_client(client, Some("s3cret")).with_code(code);
    let server = OAuth2Server::new(Arc::new(model));

    let mut response = Response::new();
    let mismatched = code_exchange_request("bound")
        .with_body_param("redirect_uri", "https://example.com/other");
    let err = server.token(&mismatched, &mut response, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid request: `redirect_uri` is invalid");
}

// ─── PKCE ────────────────────────────────────────────────────────────────────

fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn pkce_model(verifier: &str) -> MockModel {
    let client = confidential_client("app", CODE_GRANTS);
    let mut code = code_record("pkce-code", &client, 300);
    code.code_challenge = Some(s256_challenge(verifier));
    code.code_challenge_method = Some(CodeChallengeMethod::S256);
    MockModel::new().with_client(client, Some("s3cret")).with_code(code)
}

#[tokio::test]
async fn test_pkce_s256_accepts_matching_verifier() {
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    let server = OAuth2Server::new(Arc::new(pkce_model(verifier)));

    let mut response = Response::new();
    let request = code_exchange_request("pkce-code").with_body_param("code_verifier", verifier);
    let token = server.token(&request, &mut response, None).await.unwrap();
    assert_eq!(token.authorization_code.as_deref(), Some("pkce-code"));
}

#[tokio::test]
async fn test_pkce_rejects_wrong_verifier() {
    let server = OAuth2Server::new(Arc::new(pkce_model("right-verifier-right-verifier-right")));

    let mut response = Response::new();
    let request = code_exchange_request("pkce-code")
        .with_body_param("code_verifier", "wrong-verifier-wrong-verifier-wrong-");
    let err = server.token(&request, &mut response, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid grant: code verifier is invalid");
}

#[tokio::test]
async fn test_pkce_rejects_missing_verifier() {
    let server = OAuth2Server::new(Arc::new(pkce_model("some-verifier-some-verifier-some-ver")));

    let mut response = Response::new();
    let err =
        server.token(&code_exchange_request("pkce-code"), &mut response, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid grant: code verifier is invalid");
}

// ─── Refresh token rotation ──────────────────────────────────────────────────

fn refresh_request(token: &str) -> oauth2_engine::Request {
    form_post()
        .with_header("Authorization", basic_auth("app", "s3cret"))
        .with_body_param("grant_type", "refresh_token")
        .with_body_param("refresh_token", token)
}

#[tokio::test]
async fn test_refresh_rotates_token_by_default() {
    let client = confidential_client("app", CODE_GRANTS);
    let model = MockModel::new()
        .with_client(client.clone(), Some("s3cret"))
        .with_refresh_token(refresh_token_record("old-refresh", &client, 3600));
    let model = Arc::new(model);
    let server = OAuth2Server::new(Arc::clone(&model));

    let mut response = Response::new();
    let token = server.token(&refresh_request("old-refresh"), &mut response, None).await.unwrap();

    let rotated = token.refresh_token.as_deref().unwrap();
    assert_ne!(rotated, "old-refresh");
    assert!(!model.refresh_token_exists("old-refresh"));
    assert!(model.refresh_token_exists(rotated));
}

#[tokio::test]
async fn test_refresh_without_rotation_keeps_old_token() {
    let client = confidential_client("app", CODE_GRANTS);
    let model = MockModel::new()
        .with_client(client.clone(), Some("s3cret"))
        .with_refresh_token(refresh_token_record("keep-me", &client, 3600));
    let model = Arc::new(model);
    let options = ServerOptions { always_issue_new_refresh_token: false, ..Default::default() };
    let server = OAuth2Server::with_options(Arc::clone(&model), options);

    let mut response = Response::new();
    let token = server.token(&refresh_request("keep-me"), &mut response, None).await.unwrap();

    assert!(token.refresh_token.is_none());
    assert!(response.body().unwrap().get("refresh_token").is_none());
    assert!(model.refresh_token_exists("keep-me"));
}

#[tokio::test]
async fn test_expired_refresh_token_is_rejected() {
    let client = confidential_client("app", CODE_GRANTS);
    let model = MockModel::new()
        .with_client(client.clone(), Some("s3cret"))
        .with_refresh_token(refresh_token_record("stale", &client, -1));
    let server = OAuth2Server::new(Arc::new(model));

    let mut response = Response::new();
    let err = server.token(&refresh_request("stale"), &mut response, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid grant: refresh token has expired");
}

#[tokio::test]
async fn test_unknown_refresh_token_is_rejected() {
    let client = confidential_client("app", CODE_GRANTS);
    let model = MockModel::new().with_client(client, Some("s3cret"));
    let server = OAuth2Server::new(Arc::new(model));

    let mut response = Response::new();
    let err = server.token(&refresh_request("nonesuch"), &mut response, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid grant: refresh token is invalid");
}
