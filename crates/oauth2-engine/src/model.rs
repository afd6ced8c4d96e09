//! Capability interfaces the host's persistence/identity adapter implements.
//!
//! Each grant and handler requires only the capabilities it actually invokes,
//! expressed as trait bounds, so a handler cannot be constructed over a model
//! that lacks a required method. Optional capabilities (`validate_scope`,
//! the `generate_*` hooks) carry default implementations: returning `Ok(None)`
//! from a generator makes the engine fall back to its own random generator.
//!
//! Model methods fail with `anyhow::Error`. A failure that downcasts to
//! [`OAuthError`](crate::error::OAuthError) passes through the engine
//! untouched; anything else is wrapped as a server error with the cause
//! preserved.

use async_trait::async_trait;

use crate::scope::Scope;
use crate::types::{AccessToken, AuthorizationCode, Client, RefreshToken, Token, User};

/// Result type for model operations.
pub type ModelResult<T> = anyhow::Result<T>;

/// Client lookup, required by the token, authorize and revoke handlers.
#[async_trait]
pub trait ClientModel: Send + Sync {
    /// Fetch a client by id, verifying the secret when one is given.
    ///
    /// Return `None` for an unknown client or a failed secret check; both
    /// channels (HTTP Basic and form body) resolve through this one method.
    async fn get_client(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> ModelResult<Option<Client>>;
}

/// Token persistence, required by every grant that issues tokens.
#[async_trait]
pub trait IssueModel: Send + Sync {
    /// Persist an issued token and return the stored record.
    ///
    /// The returned record may carry extra attributes in `Token::extra`; they
    /// reach the wire only when extended token attributes are enabled.
    async fn save_token(&self, token: Token) -> ModelResult<Token>;

    /// Validate (and possibly narrow) the requested scope for this
    /// user/client pair.
    ///
    /// Returning `None` while a scope was requested rejects the request with
    /// an invalid-scope error. The default passes the requested scope
    /// through unchanged.
    async fn validate_scope(
        &self,
        _user: &User,
        _client: &Client,
        scope: Option<&Scope>,
    ) -> ModelResult<Option<Scope>> {
        Ok(scope.cloned())
    }

    /// Generate an access token string, or `None` for the engine default.
    async fn generate_access_token(
        &self,
        _client: &Client,
        _user: &User,
        _scope: Option<&Scope>,
    ) -> ModelResult<Option<String>> {
        Ok(None)
    }

    /// Generate a refresh token string, or `None` for the engine default.
    async fn generate_refresh_token(
        &self,
        _client: &Client,
        _user: &User,
        _scope: Option<&Scope>,
    ) -> ModelResult<Option<String>> {
        Ok(None)
    }
}

/// Capabilities of the authorization_code grant and the code response type.
#[async_trait]
pub trait AuthorizationCodeModel: IssueModel {
    /// Fetch an authorization code record by its code string.
    async fn get_authorization_code(&self, code: &str) -> ModelResult<Option<AuthorizationCode>>;

    /// Persist a newly issued authorization code and return the stored record.
    async fn save_authorization_code(
        &self,
        code: AuthorizationCode,
    ) -> ModelResult<AuthorizationCode>;

    /// Revoke a consumed authorization code. Returning `false` invalidates
    /// the exchange (the grant treats the code as invalid).
    async fn revoke_authorization_code(&self, code: &AuthorizationCode) -> ModelResult<bool>;

    /// Generate an authorization code string, or `None` for the engine default.
    async fn generate_authorization_code(
        &self,
        _client: &Client,
        _user: &User,
        _scope: Option<&Scope>,
    ) -> ModelResult<Option<String>> {
        Ok(None)
    }
}

/// Capabilities of the client_credentials grant.
#[async_trait]
pub trait ClientCredentialsModel: IssueModel {
    /// Resolve the user a confidential client acts on behalf of.
    async fn get_user_from_client(&self, client: &Client) -> ModelResult<Option<User>>;
}

/// Capabilities of the password grant.
#[async_trait]
pub trait PasswordModel: IssueModel {
    /// Verify resource-owner credentials and return the user.
    async fn get_user(&self, username: &str, password: &str) -> ModelResult<Option<User>>;
}

/// Capabilities of the refresh_token grant and the revoke handler.
#[async_trait]
pub trait RefreshTokenModel: IssueModel {
    /// Fetch a refresh token record by its token string.
    async fn get_refresh_token(&self, refresh_token: &str) -> ModelResult<Option<RefreshToken>>;

    /// Revoke a token by its string. Returning `false` reports the token as
    /// invalid.
    async fn revoke_token(&self, token: &str) -> ModelResult<bool>;
}

/// Capabilities of the authenticate handler (resource protection).
#[async_trait]
pub trait AuthenticateModel: Send + Sync {
    /// Fetch an access token record by its bearer string.
    async fn get_access_token(&self, access_token: &str) -> ModelResult<Option<AccessToken>>;

    /// Whether the token's scope covers the required scope.
    async fn verify_scope(&self, token: &AccessToken, scope: &Scope) -> ModelResult<bool>;
}

/// The full capability set, required only by the [`OAuth2Server`] facade.
///
/// Blanket-implemented for any type providing every capability; hosts
/// embedding a single handler implement only the traits that handler needs.
///
/// [`OAuth2Server`]: crate::server::OAuth2Server
pub trait Model:
    ClientModel
    + AuthorizationCodeModel
    + ClientCredentialsModel
    + PasswordModel
    + RefreshTokenModel
    + AuthenticateModel
{
}

impl<T> Model for T where
    T: ClientModel
        + AuthorizationCodeModel
        + ClientCredentialsModel
        + PasswordModel
        + RefreshTokenModel
        + AuthenticateModel
{
}
