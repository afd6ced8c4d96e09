//! Integration tests for the token endpoint.
//!
//! Covers the request envelope, client authentication through both channels,
//! grant dispatch, and the bearer response shape.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;

use common::{MockModel, basic_auth, confidential_client, form_post, test_user};
use oauth2_engine::grants::{GrantEngine, GrantOptions};
use oauth2_engine::handlers::TokenHandler;
use oauth2_engine::{
    Client, OAuth2Server, OAuthError, Request, Response, ServerOptions, Token, TokenOptions,
};

fn password_server() -> OAuth2Server<MockModel> {
    let model = MockModel::new()
        .with_client(confidential_client("app", &["password", "refresh_token"]), Some("s3cret"))
        .with_user("ada", "pa55word");
    OAuth2Server::new(Arc::new(model))
}

fn password_request() -> Request {
    form_post()
        .with_body_param("grant_type", "password")
        .with_body_param("username", "ada")
        .with_body_param("password", "pa55word")
}

// ─── Request envelope ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rejects_non_post_method() {
    let server = password_server();
    let request = Request::new("GET")
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_header("Authorization", basic_auth("app", "s3cret"));
    let mut response = Response::new();

    let err = server.token(&request, &mut response, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid request: method must be POST");
    assert_eq!(response.status(), 400);
    assert_eq!(response.body().unwrap()["error"], "invalid_request");
}

#[tokio::test]
async fn test_rejects_non_form_content() {
    let server = password_server();
    let request = Request::new("POST")
        .with_header("Content-Type", "application/json")
        .with_header("Authorization", basic_auth("app", "s3cret"));
    let mut response = Response::new();

    let err = server.token(&request, &mut response, None).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid request: content must be application/x-www-form-urlencoded"
    );
}

// ─── Client authentication ───────────────────────────────────────────────────

#[tokio::test]
async fn test_basic_and_body_credentials_are_equivalent() {
    let server = password_server();

    let via_header =
        password_request().with_header("Authorization", basic_auth("app", "s3cret"));
    let via_body = password_request()
        .with_body_param("client_id", "app")
        .with_body_param("client_secret", "s3cret");

    for request in [via_header, via_body] {
        let mut response = Response::new();
        let token = server.token(&request, &mut response, None).await.unwrap();
        assert_eq!(token.client.id, "app");
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn test_bad_secret_in_body_is_400() {
    let server = password_server();
    let request = password_request()
        .with_body_param("client_id", "app")
        .with_body_param("client_secret", "wrong");
    let mut response = Response::new();

    let err = server.token(&request, &mut response, None).await.unwrap_err();
    assert_eq!(err.name(), "invalid_client");
    assert_eq!(response.status(), 400);
    assert!(response.header("www-authenticate").is_none());
}

#[tokio::test]
async fn test_bad_secret_in_basic_header_is_401_with_challenge() {
    let server = password_server();
    let request = password_request().with_header("Authorization", basic_auth("app", "wrong"));
    let mut response = Response::new();

    let err = server.token(&request, &mut response, None).await.unwrap_err();
    assert_eq!(err.name(), "invalid_client");
    assert_eq!(response.status(), 401);
    assert_eq!(response.header("www-authenticate"), Some("Basic realm=\"Service\""));
}

#[tokio::test]
async fn test_public_client_when_authentication_not_required() {
    let model = MockModel::new()
        .with_client(confidential_client("spa", &["password"]), None)
        .with_user("ada", "pa55word");
    let mut options = ServerOptions::default();
    options.require_client_authentication.insert("password".into(), false);
    let server = OAuth2Server::with_options(Arc::new(model), options);

    let request = password_request().with_body_param("client_id", "spa");
    let mut response = Response::new();

    let token = server.token(&request, &mut response, None).await.unwrap();
    assert_eq!(token.client.id, "spa");
}

// ─── Grant dispatch ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_grant_type() {
    let server = password_server();
    let request = form_post().with_header("Authorization", basic_auth("app", "s3cret"));
    let mut response = Response::new();

    let err = server.token(&request, &mut response, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid request: Missing parameter: `grant_type`");
}

#[tokio::test]
async fn test_unregistered_grant_type() {
    let server = password_server();
    let request = form_post()
        .with_header("Authorization", basic_auth("app", "s3cret"))
        .with_body_param("grant_type", "device_code");
    let mut response = Response::new();

    let err = server.token(&request, &mut response, None).await.unwrap_err();
    assert_eq!(err.name(), "unsupported_grant_type");
}

#[tokio::test]
async fn test_grant_type_not_allowed_for_client() {
    let model = MockModel::new()
        .with_client(confidential_client("app", &["authorization_code"]), Some("s3cret"))
        .with_user("ada", "pa55word");
    let server = OAuth2Server::new(Arc::new(model));

    let request = password_request().with_header("Authorization", basic_auth("app", "s3cret"));
    let mut response = Response::new();

    let err = server.token(&request, &mut response, None).await.unwrap_err();
    assert_eq!(err.name(), "unauthorized_client");
    assert_eq!(response.status(), 400);
}

// ─── Bearer response ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_password_grant_end_to_end() {
    common::init_tracing();
    let server = password_server();
    let request = password_request().with_header("Authorization", basic_auth("app", "s3cret"));
    let mut response = Response::new();

    let token = server.token(&request, &mut response, None).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.header("cache-control"), Some("no-store"));
    assert_eq!(response.header("pragma"), Some("no-cache"));

    let body = response.body().unwrap();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["access_token"], token.access_token.as_str());
    assert_eq!(body["refresh_token"], token.refresh_token.as_deref().unwrap());
    assert_eq!(body["access_token"].as_str().unwrap().len(), 64);

    let expires_in = body["expires_in"].as_i64().unwrap();
    assert!((3595..=3600).contains(&expires_in));
}

#[tokio::test]
async fn test_client_credentials_grant_has_no_refresh_token() {
    let model =
        MockModel::new().with_client(confidential_client("svc", &["client_credentials"]), Some("k"));
    let server = OAuth2Server::new(Arc::new(model));

    let request = form_post()
        .with_header("Authorization", basic_auth("svc", "k"))
        .with_body_param("grant_type", "client_credentials");
    let mut response = Response::new();

    let token = server.token(&request, &mut response, None).await.unwrap();
    assert!(token.refresh_token.is_none());
    assert!(response.body().unwrap().get("refresh_token").is_none());
}

#[tokio::test]
async fn test_per_client_lifetime_overrides_server_default() {
    let mut client = confidential_client("app", &["password"]);
    client.access_token_lifetime = Some(60);
    let model = MockModel::new().with_client(client, Some("s3cret")).with_user("ada", "pa55word");
    let server = OAuth2Server::new(Arc::new(model));

    let request = password_request().with_header("Authorization", basic_auth("app", "s3cret"));
    let mut response = Response::new();

    server.token(&request, &mut response, None).await.unwrap();
    let expires_in = response.body().unwrap()["expires_in"].as_i64().unwrap();
    assert!((55..=60).contains(&expires_in));
}

#[tokio::test]
async fn test_per_call_options_override_server_default() {
    let server = password_server();
    let request = password_request().with_header("Authorization", basic_auth("app", "s3cret"));
    let mut response = Response::new();

    let options =
        TokenOptions { access_token_lifetime: Some(120), ..TokenOptions::default() };
    server.token(&request, &mut response, Some(options)).await.unwrap();

    let expires_in = response.body().unwrap()["expires_in"].as_i64().unwrap();
    assert!((115..=120).contains(&expires_in));
}

#[tokio::test]
async fn test_invalid_user_credentials() {
    let server = password_server();
    let request = form_post()
        .with_header("Authorization", basic_auth("app", "s3cret"))
        .with_body_param("grant_type", "password")
        .with_body_param("username", "ada")
        .with_body_param("password", "nope");
    let mut response = Response::new();

    let err = server.token(&request, &mut response, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid grant: user credentials are invalid");
    assert_eq!(response.status(), 400);
}

// ─── Extension grants ────────────────────────────────────────────────────────

struct StaticGrant;

#[async_trait]
impl GrantEngine for StaticGrant {
    async fn handle(&self, _request: &Request, client: &Client) -> Result<Token, OAuthError> {
        Ok(Token {
            access_token: "ext-token".into(),
            access_token_expires_at: None,
            refresh_token: None,
            refresh_token_expires_at: None,
            scope: None,
            client: client.clone(),
            user: test_user(),
            authorization_code: None,
            extra: Map::new(),
        })
    }
}

#[tokio::test]
async fn test_extension_grant_dispatch() {
    const GRANT_URI: &str = "urn:ietf:params:oauth:grant-type:saml2-bearer";

    let model =
        MockModel::new().with_client(confidential_client("app", &[GRANT_URI]), Some("s3cret"));
    let mut handler = TokenHandler::new(Arc::new(model), &ServerOptions::default());
    handler
        .register_extension_grant(GRANT_URI, Arc::new(|_, _: GrantOptions| Box::new(StaticGrant)))
        .unwrap();

    let request = form_post()
        .with_header("Authorization", basic_auth("app", "s3cret"))
        .with_body_param("grant_type", GRANT_URI);
    let mut response = Response::new();

    let token = handler.handle(&request, &mut response).await.unwrap();
    assert_eq!(token.access_token, "ext-token");
    assert_eq!(response.body().unwrap()["access_token"], "ext-token");
}

#[tokio::test]
async fn test_extension_grant_requires_uri_name() {
    let model = MockModel::new();
    let mut handler = TokenHandler::new(Arc::new(model), &ServerOptions::default());

    let err = handler
        .register_extension_grant("not a uri", Arc::new(|_, _: GrantOptions| Box::new(StaticGrant)))
        .unwrap_err();
    assert_eq!(err.name(), "invalid_argument");
}
