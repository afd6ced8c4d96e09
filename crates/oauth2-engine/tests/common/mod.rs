//! In-memory model backing the integration tests.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{Duration, Utc};
use serde_json::json;

use oauth2_engine::model::{
    AuthenticateModel, AuthorizationCodeModel, ClientCredentialsModel, ClientModel, IssueModel,
    ModelResult, PasswordModel, RefreshTokenModel,
};
use oauth2_engine::{
    AccessToken, AuthorizationCode, Client, RefreshToken, Request, Scope, Token, User,
};

/// An in-memory adapter holding clients, users and token records.
#[derive(Default)]
pub struct MockModel {
    clients: Mutex<HashMap<String, (Client, Option<String>)>>,
    users: Mutex<HashMap<String, String>>,
    codes: Mutex<HashMap<String, AuthorizationCode>>,
    access_tokens: Mutex<HashMap<String, AccessToken>>,
    refresh_tokens: Mutex<HashMap<String, RefreshToken>>,
    saved: Mutex<Vec<Token>>,
    fail_code_saves: bool,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(self, client: Client, secret: Option<&str>) -> Self {
        self.clients
            .lock()
            .unwrap()
            .insert(client.id.clone(), (client, secret.map(String::from)));
        self
    }

    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.users.lock().unwrap().insert(username.into(), password.into());
        self
    }

    pub fn with_code(self, code: AuthorizationCode) -> Self {
        self.codes.lock().unwrap().insert(code.code.clone(), code);
        self
    }

    pub fn with_access_token(self, token: AccessToken) -> Self {
        self.access_tokens.lock().unwrap().insert(token.access_token.clone(), token);
        self
    }

    pub fn with_refresh_token(self, token: RefreshToken) -> Self {
        self.refresh_tokens.lock().unwrap().insert(token.refresh_token.clone(), token);
        self
    }

    /// Make `save_authorization_code` fail, as a broken backing store would.
    pub fn with_failing_code_save(mut self) -> Self {
        self.fail_code_saves = true;
        self
    }

    /// Tokens persisted through `save_token`, in order.
    pub fn saved_tokens(&self) -> Vec<Token> {
        self.saved.lock().unwrap().clone()
    }

    /// Whether a code with this string is still stored.
    pub fn code_exists(&self, code: &str) -> bool {
        self.codes.lock().unwrap().contains_key(code)
    }

    /// Whether a refresh token with this string is still stored.
    pub fn refresh_token_exists(&self, token: &str) -> bool {
        self.refresh_tokens.lock().unwrap().contains_key(token)
    }
}

#[async_trait]
impl ClientModel for MockModel {
    async fn get_client(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> ModelResult<Option<Client>> {
        let clients = self.clients.lock().unwrap();
        Ok(clients.get(client_id).and_then(|(client, secret)| {
            match (client_secret, secret.as_deref()) {
                (Some(given), Some(stored)) if given == stored => Some(client.clone()),
                (Some(_), _) => None,
                (None, _) => Some(client.clone()),
            }
        }))
    }
}

#[async_trait]
impl IssueModel for MockModel {
    async fn save_token(&self, token: Token) -> ModelResult<Token> {
        self.saved.lock().unwrap().push(token.clone());
        self.access_tokens.lock().unwrap().insert(
            token.access_token.clone(),
            AccessToken {
                access_token: token.access_token.clone(),
                access_token_expires_at: token.access_token_expires_at,
                scope: token.scope.clone(),
                client: token.client.clone(),
                user: token.user.clone(),
            },
        );
        if let Some(refresh) = &token.refresh_token {
            self.refresh_tokens.lock().unwrap().insert(
                refresh.clone(),
                RefreshToken {
                    refresh_token: refresh.clone(),
                    refresh_token_expires_at: token.refresh_token_expires_at,
                    scope: token.scope.clone(),
                    client: token.client.clone(),
                    user: token.user.clone(),
                },
            );
        }
        Ok(token)
    }
}

#[async_trait]
impl AuthorizationCodeModel for MockModel {
    async fn get_authorization_code(&self, code: &str) -> ModelResult<Option<AuthorizationCode>> {
        Ok(self.codes.lock().unwrap().get(code).cloned())
    }

    async fn save_authorization_code(
        &self,
        code: AuthorizationCode,
    ) -> ModelResult<AuthorizationCode> {
        if self.fail_code_saves {
            anyhow::bail!("code store unavailable");
        }
        self.codes.lock().unwrap().insert(code.code.clone(), code.clone());
        Ok(code)
    }

    async fn revoke_authorization_code(&self, code: &AuthorizationCode) -> ModelResult<bool> {
        Ok(self.codes.lock().unwrap().remove(&code.code).is_some())
    }
}

#[async_trait]
impl ClientCredentialsModel for MockModel {
    async fn get_user_from_client(&self, client: &Client) -> ModelResult<Option<User>> {
        Ok(Some(json!({ "service_account": client.id })))
    }
}

#[async_trait]
impl PasswordModel for MockModel {
    async fn get_user(&self, username: &str, password: &str) -> ModelResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .get(username)
            .filter(|stored| *stored == password)
            .map(|_| json!({ "username": username })))
    }
}

#[async_trait]
impl RefreshTokenModel for MockModel {
    async fn get_refresh_token(&self, refresh_token: &str) -> ModelResult<Option<RefreshToken>> {
        Ok(self.refresh_tokens.lock().unwrap().get(refresh_token).cloned())
    }

    async fn revoke_token(&self, token: &str) -> ModelResult<bool> {
        let from_refresh = self.refresh_tokens.lock().unwrap().remove(token).is_some();
        let from_access = self.access_tokens.lock().unwrap().remove(token).is_some();
        Ok(from_refresh || from_access)
    }
}

#[async_trait]
impl AuthenticateModel for MockModel {
    async fn get_access_token(&self, access_token: &str) -> ModelResult<Option<AccessToken>> {
        Ok(self.access_tokens.lock().unwrap().get(access_token).cloned())
    }

    async fn verify_scope(&self, token: &AccessToken, scope: &Scope) -> ModelResult<bool> {
        Ok(token.scope.as_ref().is_some_and(|granted| scope.is_subset_of(granted)))
    }
}

// ─── Builders ────────────────────────────────────────────────────────────────

pub fn confidential_client(id: &str, grants: &[&str]) -> Client {
    Client::new(id, grants.iter().map(|g| (*g).to_string()).collect())
}

pub fn test_user() -> User {
    json!({ "username": "ada" })
}

pub fn access_token_record(token: &str, client: &Client, ttl_secs: i64) -> AccessToken {
    AccessToken {
        access_token: token.into(),
        access_token_expires_at: Some(Utc::now() + Duration::seconds(ttl_secs)),
        scope: None,
        client: client.clone(),
        user: test_user(),
    }
}

pub fn refresh_token_record(token: &str, client: &Client, ttl_secs: i64) -> RefreshToken {
    RefreshToken {
        refresh_token: token.into(),
        refresh_token_expires_at: Some(Utc::now() + Duration::seconds(ttl_secs)),
        scope: None,
        client: client.clone(),
        user: test_user(),
    }
}

pub fn code_record(code: &str, client: &Client, ttl_secs: i64) -> AuthorizationCode {
    AuthorizationCode {
        code: code.into(),
        expires_at: Utc::now() + Duration::seconds(ttl_secs),
        redirect_uri: None,
        scope: None,
        client: client.clone(),
        user: test_user(),
        code_challenge: None,
        code_challenge_method: None,
    }
}

/// Install a test subscriber so failing runs show the engine's traces.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A form-encoded POST, the envelope every token/revoke request needs.
pub fn form_post() -> Request {
    Request::new("POST").with_header("Content-Type", "application/x-www-form-urlencoded")
}

pub fn basic_auth(client_id: &str, client_secret: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{client_id}:{client_secret}")))
}
