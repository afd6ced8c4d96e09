//! Core data model: clients, users, codes, tokens and the bearer wire shape.
//!
//! Records returned by the model carry their owning `client` and `user` as
//! required fields, so the adapter-contract invariant "client and user must
//! always be populated" holds by construction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::OAuthError;
use crate::scope::Scope;

/// The resource owner, as an opaque identity object owned by the host.
pub type User = Value;

/// A registered OAuth client, read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    /// Client identifier.
    pub id: String,
    /// Grant types this client may use.
    pub grants: Vec<String>,
    /// Registered redirect URIs (exact-match checked on authorize).
    pub redirect_uris: Vec<String>,
    /// Per-client access token lifetime override, in seconds.
    pub access_token_lifetime: Option<u64>,
    /// Per-client refresh token lifetime override, in seconds.
    pub refresh_token_lifetime: Option<u64>,
}

impl Client {
    /// Create a client with the given id and allowed grants.
    #[must_use]
    pub fn new(id: impl Into<String>, grants: Vec<String>) -> Self {
        Self {
            id: id.into(),
            grants,
            redirect_uris: Vec::new(),
            access_token_lifetime: None,
            refresh_token_lifetime: None,
        }
    }
}

/// PKCE code challenge method (RFC 7636 §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeChallengeMethod {
    /// The verifier is compared to the challenge directly.
    Plain,
    /// The verifier is SHA-256 hashed and base64url-encoded before comparison.
    S256,
}

impl CodeChallengeMethod {
    /// The wire name of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
        }
    }
}

/// A single-use authorization code issued during the authorize step.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    /// The code string handed to the client.
    pub code: String,
    /// Absolute expiry. A code is expired once `expires_at <= now`.
    pub expires_at: DateTime<Utc>,
    /// Redirect URI the code was bound to, if one was presented.
    pub redirect_uri: Option<String>,
    /// Scope approved for this code.
    pub scope: Option<Scope>,
    /// The client the code was issued to.
    pub client: Client,
    /// The resource owner who approved the request.
    pub user: User,
    /// PKCE challenge, for public clients.
    pub code_challenge: Option<String>,
    /// PKCE challenge method. Its presence turns on verification.
    pub code_challenge_method: Option<CodeChallengeMethod>,
}

impl AuthorizationCode {
    /// Whether the code is expired at `now`. The boundary is strict: a code
    /// expiring exactly at `now` is already expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// An access token record as returned by the model's token lookup.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The bearer token string.
    pub access_token: String,
    /// Absolute expiry, when the adapter tracks one.
    pub access_token_expires_at: Option<DateTime<Utc>>,
    /// Scope the token was issued with.
    pub scope: Option<Scope>,
    /// Owning client.
    pub client: Client,
    /// Resource owner.
    pub user: User,
}

impl AccessToken {
    /// Whether the token is expired at `now` (strict boundary; a missing
    /// expiry never expires).
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.access_token_expires_at.is_some_and(|at| at <= now)
    }
}

/// A refresh token record as returned by the model's token lookup.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    /// The refresh token string.
    pub refresh_token: String,
    /// Absolute expiry, when the adapter tracks one.
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    /// Scope the original grant was issued with.
    pub scope: Option<Scope>,
    /// Owning client.
    pub client: Client,
    /// Resource owner.
    pub user: User,
}

impl RefreshToken {
    /// Whether the token is expired at `now` (strict boundary).
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.refresh_token_expires_at.is_some_and(|at| at <= now)
    }
}

/// The token aggregate produced by a grant and persisted via `save_token`.
///
/// Immutable once returned to the caller. `extra` carries any custom
/// attributes the adapter attached to the saved record; they reach the wire
/// only when extended token attributes are enabled.
#[derive(Debug, Clone)]
pub struct Token {
    /// The bearer token string.
    pub access_token: String,
    /// Absolute access token expiry.
    pub access_token_expires_at: Option<DateTime<Utc>>,
    /// Refresh token, when the grant issues one.
    pub refresh_token: Option<String>,
    /// Absolute refresh token expiry.
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    /// Scope the token was issued with.
    pub scope: Option<Scope>,
    /// Owning client.
    pub client: Client,
    /// Resource owner.
    pub user: User,
    /// The authorization code exchanged for this token, when applicable.
    pub authorization_code: Option<String>,
    /// Adapter-supplied custom attributes.
    pub extra: Map<String, Value>,
}

impl Token {
    /// Validate the adapter's save result where the type system cannot.
    ///
    /// # Errors
    ///
    /// `Server` when the record violates the adapter contract.
    pub fn validate(&self) -> Result<(), OAuthError> {
        if self.access_token.is_empty() {
            return Err(OAuthError::server("missing `access_token`"));
        }
        Ok(())
    }
}

/// The RFC 6750 bearer token wire representation.
///
/// `expires_in` is derived from the expiry at the moment this view is built,
/// so a slow adapter shortens the advertised lifetime rather than extending
/// the token.
#[derive(Debug, Serialize)]
pub struct BearerToken {
    /// The bearer token string.
    pub access_token: String,
    /// Always `"Bearer"`.
    pub token_type: &'static str,
    /// Remaining lifetime in whole seconds, when an expiry was computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// Refresh token, when the grant issued one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Scope, space-joined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Custom attributes, merged in at the serialization boundary.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BearerToken {
    /// Build the wire view of an issued token.
    #[must_use]
    pub fn from_token(token: &Token, allow_extended_attributes: bool) -> Self {
        let expires_in =
            token.access_token_expires_at.map(|at| (at - Utc::now()).num_seconds());

        Self {
            access_token: token.access_token.clone(),
            token_type: "Bearer",
            expires_in,
            refresh_token: token.refresh_token.clone(),
            scope: token.scope.clone(),
            extra: if allow_extended_attributes { token.extra.clone() } else { Map::new() },
        }
    }
}
