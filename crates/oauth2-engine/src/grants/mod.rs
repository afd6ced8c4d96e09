//! Grant-type engines: request-to-token state machines (RFC 6749 §4).
//!
//! Each engine is generic over the model capabilities it needs and exposes
//! the object-safe [`GrantEngine`] trait so the token handler can dispatch
//! grants (built-in and extension) through one registry.

pub mod authorization_code;
pub mod client_credentials;
pub mod implicit;
pub mod password;
pub mod refresh_token;

pub(crate) mod common;

use async_trait::async_trait;

pub use authorization_code::AuthorizationCodeGrant;
pub use client_credentials::ClientCredentialsGrant;
pub use implicit::ImplicitGrant;
pub use password::PasswordGrant;
pub use refresh_token::RefreshTokenGrant;

use crate::error::OAuthError;
use crate::request::Request;
use crate::types::{Client, Token};

/// Effective lifetimes and issuance policy for one grant invocation.
///
/// Per-client overrides are already resolved by the time a grant is built.
#[derive(Debug, Clone, Copy)]
pub struct GrantOptions {
    /// Access token lifetime in seconds.
    pub access_token_lifetime: u64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_lifetime: u64,
    /// Whether the refresh_token grant rotates refresh tokens.
    pub always_issue_new_refresh_token: bool,
}

/// A grant engine: turns a validated client plus request into a saved token.
#[async_trait]
pub trait GrantEngine: Send + Sync {
    /// Run the grant's state machine and return the issued token.
    async fn handle(&self, request: &Request, client: &Client) -> Result<Token, OAuthError>;
}
